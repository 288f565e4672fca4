//! Tracking client facade
//!
//! The single entry point external collaborators call. Recording an event
//! is fire-and-forget: it never blocks on network I/O, never returns an
//! error, and never interrupts the calling application. All network
//! activity happens on the scheduler's own task.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::models::validation::{normalize_slug, validate_subject_id};
use crate::models::{Action, Event, EventKind, SubjectType};
use crate::pipeline::{BatchScheduler, EventSink, HttpSink, PipelineShared, PipelineStats};
use crate::session::SessionManager;

/// Process-wide tracking client
///
/// Constructed once, lazily creating its session on first recorded event,
/// and held for the process lifetime. `shutdown` consumes the handle and
/// performs the single best-effort final flush.
pub struct Tracker {
    shared: Arc<PipelineShared>,
    session: SessionManager,
    high_water_mark: usize,
    shutdown_tx: watch::Sender<bool>,
    scheduler_handle: JoinHandle<()>,
}

impl Tracker {
    /// Create a tracker delivering to the configured HTTP collector
    pub fn new(config: &Config) -> Result<Self> {
        let sink = HttpSink::new(
            config.collector.url.clone(),
            config.collector.delivery_timeout(),
        )?;
        Ok(Self::with_sink(config, Arc::new(sink)))
    }

    /// Create a tracker over an arbitrary sink
    pub fn with_sink(config: &Config, sink: Arc<dyn EventSink>) -> Self {
        let shared = Arc::new(PipelineShared::new(config));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let scheduler = BatchScheduler::new(Arc::clone(&shared), sink, config);
        let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

        Self {
            shared,
            session: SessionManager::new(),
            high_water_mark: config.queue.high_water_mark,
            shutdown_tx,
            scheduler_handle,
        }
    }

    /// Record a generic page view
    pub fn track_page_view(&self) {
        let session_id = self.session.current().session_id.clone();
        self.record(Event::page_view(session_id));
    }

    /// Record an interaction with a product or brand
    ///
    /// Invalid inputs are counted and logged, never surfaced: tracking
    /// failures must stay invisible to end users.
    pub fn track_interaction(
        &self,
        subject: SubjectType,
        subject_id: &str,
        subject_slug: &str,
        action: Action,
    ) {
        let kind = match EventKind::interaction(subject, action) {
            Ok(kind) => kind,
            Err(e) => {
                self.shared.counters.record_rejected();
                warn!(error = %e, reason = e.kind.as_str(), "Interaction rejected");
                return;
            },
        };

        if let Err(e) = validate_subject_id(subject_id) {
            self.shared.counters.record_rejected();
            warn!(error = %e, reason = e.kind.as_str(), "Interaction rejected");
            return;
        }

        let session_id = self.session.current().session_id.clone();
        self.record(Event::new(
            kind,
            subject_id,
            normalize_slug(subject_slug),
            session_id,
        ));
    }

    /// Current snapshot of the diagnostic counters
    pub fn stats(&self) -> PipelineStats {
        self.shared.counters.snapshot()
    }

    /// Signal shutdown and wait for the scheduler's final flush
    ///
    /// Bounded by the configured shutdown deadline; never hangs on
    /// network I/O. Returns the final counter snapshot.
    pub async fn shutdown(self) -> PipelineStats {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.scheduler_handle.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
        self.shared.counters.snapshot()
    }

    fn record(&self, event: Event) {
        {
            let mut dedupe = self.shared.dedupe.lock().unwrap();
            if !dedupe.should_emit(&event) {
                self.shared.counters.record_deduplicated();
                debug!(kind = %event.kind, subject_id = %event.subject_id, "Event deduplicated");
                return;
            }
        }

        let (evicted, len) = {
            let mut queue = self.shared.queue.lock().unwrap();
            let evicted = queue.enqueue(event);
            (evicted, queue.len())
        };

        self.shared.counters.record_queued();
        if let Some(old) = evicted {
            self.shared.counters.record_evicted(1);
            debug!(
                kind = %old.event.kind,
                subject_id = %old.event.subject_id,
                "Oldest event evicted under queue pressure"
            );
        }

        if len >= self.high_water_mark {
            self.shared.flush_signal.notify_one();
        }
    }
}
