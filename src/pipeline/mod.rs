//! Event pipeline for trackpipe
//!
//! This module provides:
//! - A bounded FIFO queue of pending events with front-requeue for retries
//! - A sliding-window deduplicator for interaction events
//! - A delivery worker shipping batches to the collection endpoint
//! - A batch scheduler driving flush cadence and graceful shutdown

pub mod dedupe;
pub mod queue;
pub mod scheduler;
pub mod worker;

pub use dedupe::Deduplicator;
pub use queue::{EventQueue, QueuedEvent, RequeueOutcome};
pub use scheduler::BatchScheduler;
pub use worker::{EventSink, HttpSink};

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

use crate::config::Config;

/// Outcome of one flush of the queue
#[derive(Debug, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The batch reached the collector
    Delivered(usize),

    /// Nothing was pending
    Empty,

    /// Transient failure; the batch was requeued and the next flush is
    /// gated behind the given backoff delay
    Retrying {
        requeued: usize,
        dropped: usize,
        delay: Duration,
    },

    /// Non-retryable failure; the batch was dropped
    Dropped(usize),
}

/// Diagnostic counters for the pipeline
///
/// Tracking failures are invisible to callers by design; these counters
/// are the only way they become observable.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    queued: AtomicU64,
    delivered: AtomicU64,
    deduplicated: AtomicU64,
    rejected: AtomicU64,
    evicted: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
}

impl PipelineCounters {
    /// Record one event accepted into the queue
    pub fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `n` events delivered to the collector
    pub fn record_delivered(&self, n: u64) {
        self.delivered.fetch_add(n, Ordering::Relaxed);
    }

    /// Record one event suppressed by the deduplicator
    pub fn record_deduplicated(&self) {
        self.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one event rejected by input validation
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `n` events evicted under queue pressure
    pub fn record_evicted(&self, n: u64) {
        self.evicted.fetch_add(n, Ordering::Relaxed);
    }

    /// Record one failed delivery attempt that will be retried
    pub fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `n` events dropped (retry ceiling or malformed payload)
    pub fn record_dropped(&self, n: u64) {
        self.dropped.fetch_add(n, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            queued: self.queued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of the pipeline counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Events accepted into the queue
    pub queued: u64,
    /// Events delivered to the collector
    pub delivered: u64,
    /// Events suppressed by the deduplicator
    pub deduplicated: u64,
    /// Events rejected by input validation
    pub rejected: u64,
    /// Events evicted under queue pressure
    pub evicted: u64,
    /// Failed delivery attempts that were retried
    pub retried: u64,
    /// Events lost to the retry ceiling or malformed payloads
    pub dropped: u64,
}

/// State shared between the producer-facing tracker and the scheduler task
///
/// The queue and deduplicator are the only shared mutable state in the
/// pipeline; both are reached exclusively through their documented
/// operations under these locks.
pub struct PipelineShared {
    /// Pending events, bounded FIFO
    pub queue: Mutex<EventQueue>,

    /// Sliding-window deduplicator
    pub dedupe: Mutex<Deduplicator>,

    /// Diagnostic counters
    pub counters: PipelineCounters,

    /// Wakes the scheduler when the high-water mark is crossed
    pub flush_signal: Notify,
}

impl PipelineShared {
    /// Build the shared state from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            queue: Mutex::new(EventQueue::new(config.queue.capacity)),
            dedupe: Mutex::new(Deduplicator::new(config.dedupe.window())),
            counters: PipelineCounters::default(),
            flush_signal: Notify::new(),
        }
    }
}
