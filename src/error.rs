//! Error handling module for trackpipe
//!
//! This module defines the error types used throughout the pipeline,
//! providing a unified error handling strategy. Delivery failures get
//! their own taxonomy because the scheduler's retry policy depends on
//! classifying them correctly.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for trackpipe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for trackpipe
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Batch delivery errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Shutdown in progress
    #[error("Pipeline is shutting down")]
    ShuttingDown,
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }
}

/// Failure modes of a single batch delivery attempt
///
/// The scheduler treats `Transient` and `Timeout` the same way (requeue
/// with backoff); `Malformed` batches are dropped immediately because
/// retrying a payload the collector rejected cannot succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Transient failure: connection error or 5xx response
    #[error("Transient delivery failure: {0}")]
    Transient(String),

    /// The delivery attempt exceeded its deadline
    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),

    /// The collector rejected the payload with a 4xx status
    #[error("Collector rejected payload (status {status}): {message}")]
    Malformed { status: u16, message: String },
}

impl DeliveryError {
    /// Check if this failure is worth retrying
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DeliveryError::Malformed { .. })
    }
}

/// Convert from anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

/// Convert from envconfig::Error to our Error type
impl From<envconfig::Error> for Error {
    fn from(err: envconfig::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_retryable() {
        assert!(DeliveryError::Transient("connection refused".to_string()).is_retryable());
        assert!(DeliveryError::Timeout(Duration::from_secs(10)).is_retryable());
        assert!(!DeliveryError::Malformed {
            status: 400,
            message: "bad payload".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_delivery_error_display() {
        let err = DeliveryError::Malformed {
            status: 422,
            message: "missing sessionId".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains("missing sessionId"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(Error::config("bad"), Error::Config(_)));
        assert!(matches!(Error::internal("oops"), Error::Internal(_)));
    }
}
