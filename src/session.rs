//! Session management for trackpipe
//!
//! One `Session` exists per running client instance. It is created lazily
//! on first use and shared read-only by every producer of events; a process
//! restart implicitly discards it and the next access mints a fresh one.

use chrono::{DateTime, Utc};
use std::sync::OnceLock;
use uuid::Uuid;

/// Process-lifetime identifier correlating events from one running instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Random high-entropy identifier, stable for the process lifetime
    pub session_id: String,

    /// When this session was created
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn generate() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Owns the lazily-created process-wide session
///
/// A long-lived owned value passed by handle to producers, not a global
/// mutable static. No teardown; no error conditions.
#[derive(Debug, Default)]
pub struct SessionManager {
    session: OnceLock<Session>,
}

impl SessionManager {
    /// Create a manager with no session yet
    pub fn new() -> Self {
        Self {
            session: OnceLock::new(),
        }
    }

    /// Return the current session, creating it on first call
    pub fn current(&self) -> &Session {
        self.session.get_or_init(|| {
            let session = Session::generate();
            tracing::info!(session_id = %session.session_id, "Session created");
            session
        })
    }
}
