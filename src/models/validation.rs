//! Input validation for interaction events
//!
//! The tracking facade never surfaces these failures to its caller;
//! rejected inputs are counted and logged.

use super::error::{ValidationError, ValidationErrorKind};

/// Longest subject identifier the pipeline accepts
pub const MAX_SUBJECT_ID_LEN: usize = 128;

/// Validate a subject identifier for an interaction event
pub fn validate_subject_id(subject_id: &str) -> Result<(), ValidationError> {
    if subject_id.trim().is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::EmptySubject,
            "subject_id",
            "Interaction events must name a subject",
        ));
    }

    if subject_id.len() > MAX_SUBJECT_ID_LEN {
        return Err(ValidationError::new(
            ValidationErrorKind::SubjectTooLong,
            "subject_id",
            format!(
                "Subject identifier exceeds {} bytes",
                MAX_SUBJECT_ID_LEN
            ),
        ));
    }

    Ok(())
}

/// Normalize a subject slug: trimmed and lower-cased, empty allowed
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}
