//! trackpipe Library
//!
//! An event tracking and delivery pipeline: records user-interaction
//! events (page views, product and brand interactions) and reliably ships
//! them in batches to an HTTP collection endpoint without blocking the
//! producing application.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod test_utils;
pub mod tracker;

// Re-export commonly used types at the crate root
pub use config::Config;
pub use error::{DeliveryError, Error, Result};

// Re-export model types
pub use models::{Action, Event, EventKind, SubjectType, WireEvent};

// Re-export pipeline types
pub use pipeline::{EventSink, HttpSink, PipelineStats};

// Re-export session and facade types
pub use session::{Session, SessionManager};
pub use tracker::Tracker;
