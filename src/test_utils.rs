//! Test utilities for trackpipe
//!
//! This module provides mock implementations and builders for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{
    CollectorConfig, Config, DedupeConfig, FlushConfig, QueueConfig, RetryConfig, RuntimeConfig,
};
use crate::error::DeliveryError;
use crate::models::{Action, Event, EventKind};
use crate::pipeline::{EventSink, QueuedEvent};

/// Scriptable in-memory sink recording every delivered batch
#[derive(Debug, Clone)]
pub struct MockSink {
    delivered: Arc<Mutex<Vec<Vec<QueuedEvent>>>>,
    script: Arc<Mutex<VecDeque<DeliveryError>>>,
    attempts: Arc<Mutex<u64>>,
    stall: Arc<Mutex<Option<Duration>>>,
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSink {
    /// Create a sink that accepts every batch
    pub fn new() -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            attempts: Arc::new(Mutex::new(0)),
            stall: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every delivery attempt sleep before responding
    pub fn stall_for(&self, duration: Duration) {
        *self.stall.lock().unwrap() = Some(duration);
    }

    /// Queue an error to be returned by the next delivery attempt
    pub fn fail_next(&self, error: DeliveryError) {
        self.script.lock().unwrap().push_back(error);
    }

    /// Queue `n` transient failures ahead of the next success
    pub fn fail_times_transient(&self, n: usize) {
        let mut script = self.script.lock().unwrap();
        for _ in 0..n {
            script.push_back(DeliveryError::Transient("scripted failure".to_string()));
        }
    }

    /// Batches that reached the sink successfully
    pub fn delivered_batches(&self) -> Vec<Vec<QueuedEvent>> {
        self.delivered.lock().unwrap().clone()
    }

    /// Total number of events across all delivered batches
    pub fn total_delivered(&self) -> usize {
        self.delivered.lock().unwrap().iter().map(Vec::len).sum()
    }

    /// Number of delivery attempts observed, failed ones included
    pub fn attempt_count(&self) -> u64 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl EventSink for MockSink {
    async fn deliver(&self, batch: &[QueuedEvent]) -> Result<(), DeliveryError> {
        *self.attempts.lock().unwrap() += 1;

        let stall = *self.stall.lock().unwrap();
        if let Some(duration) = stall {
            tokio::time::sleep(duration).await;
        }

        if let Some(error) = self.script.lock().unwrap().pop_front() {
            return Err(error);
        }

        self.delivered.lock().unwrap().push(batch.to_vec());
        Ok(())
    }
}

/// Configuration with the documented defaults, built without touching
/// the environment
pub fn test_config() -> Config {
    Config {
        runtime: RuntimeConfig {
            log_level: "debug".to_string(),
            environment: "development".to_string(),
        },
        collector: CollectorConfig {
            url: "http://localhost:8080/v1/events".to_string(),
            delivery_timeout_secs: 10,
        },
        queue: QueueConfig {
            capacity: 500,
            high_water_mark: 50,
        },
        flush: FlushConfig {
            interval_ms: 5000,
            batch_size: 50,
            shutdown_deadline_ms: 1000,
        },
        retry: RetryConfig {
            max_attempts: 5,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
        },
        dedupe: DedupeConfig { window_ms: 2000 },
    }
}

/// Create a product-view event for tests
pub fn test_product_view(subject_id: &str) -> Event {
    Event::new(
        EventKind::ProductInteraction(Action::View),
        subject_id,
        subject_id,
        "test-session",
    )
}
