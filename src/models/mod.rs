//! Data models for trackpipe
//!
//! This module defines the event structures used throughout the pipeline:
//! the immutable domain `Event`, its wire representation for the collection
//! endpoint, and the validation layer guarding interaction inputs.

pub mod error;
pub mod event;
pub mod validation;

// Re-export commonly used types
pub use error::{ValidationError, ValidationErrorKind};
pub use event::{Action, DedupeKey, Event, EventKind, SubjectType, WireEvent};
