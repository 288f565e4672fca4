//! Validation error types for event inputs
//!
//! Validation failures never reach the caller of the tracking facade;
//! they are counted and logged, so these types only need to describe the
//! problem well enough for diagnostics.

use thiserror::Error;

/// Category of a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Interaction events must name a subject
    EmptySubject,
    /// Subject identifier exceeds the accepted length
    SubjectTooLong,
    /// The action is not valid for the subject type
    InvalidAction,
    /// Unknown action string
    UnknownAction,
}

impl ValidationErrorKind {
    /// Stable string label, used as a tracing field
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::EmptySubject => "empty_subject",
            ValidationErrorKind::SubjectTooLong => "subject_too_long",
            ValidationErrorKind::InvalidAction => "invalid_action",
            ValidationErrorKind::UnknownAction => "unknown_action",
        }
    }
}

/// A single validation failure with field context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed on '{field}': {message}")]
pub struct ValidationError {
    /// Failure category
    pub kind: ValidationErrorKind,
    /// Field that failed validation
    pub field: &'static str,
    /// Human-readable description
    pub message: String,
}

impl ValidationError {
    /// Create a validation error with context
    pub fn new(
        kind: ValidationErrorKind,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(
            ValidationErrorKind::EmptySubject,
            "subject_id",
            "subject identifier is required",
        );
        let msg = err.to_string();
        assert!(msg.contains("subject_id"));
        assert!(msg.contains("required"));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ValidationErrorKind::EmptySubject.as_str(), "empty_subject");
        assert_eq!(ValidationErrorKind::InvalidAction.as_str(), "invalid_action");
    }
}
