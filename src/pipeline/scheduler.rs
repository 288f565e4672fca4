//! Batch scheduler driving flush cadence and shutdown
//!
//! A single dedicated task flushes the queue when the periodic interval
//! elapses or when the producer side signals that the high-water mark was
//! crossed, whichever fires first. Delivery is intentionally not
//! parallelized: batches are small and infrequent, and out-of-order
//! arrival would break the collector's monotonic batch timestamps.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn, Instrument};

use super::{EventSink, FlushOutcome, PipelineShared};
use crate::config::Config;
use crate::logging::Timer;
use crate::{flush_span, log_error};

/// Drives flushes of the queue through the delivery sink
pub struct BatchScheduler {
    shared: Arc<PipelineShared>,
    sink: Arc<dyn EventSink>,
    flush_interval: Duration,
    batch_size: usize,
    high_water_mark: usize,
    retry_ceiling: u32,
    base_delay: Duration,
    max_delay: Duration,
    shutdown_deadline: Duration,
}

impl BatchScheduler {
    /// Create a scheduler over the shared pipeline state
    pub fn new(shared: Arc<PipelineShared>, sink: Arc<dyn EventSink>, config: &Config) -> Self {
        Self {
            shared,
            sink,
            flush_interval: config.flush.interval(),
            batch_size: config.flush.batch_size,
            high_water_mark: config.queue.high_water_mark,
            retry_ceiling: config.retry.max_attempts,
            base_delay: config.retry.base_delay(),
            max_delay: config.retry.max_delay(),
            shutdown_deadline: config.flush.shutdown_deadline(),
        }
    }

    /// Run until the shutdown signal fires, then perform one best-effort
    /// final flush under the shutdown deadline
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.flush_interval.as_millis() as u64,
            batch_size = self.batch_size,
            "Batch scheduler started"
        );

        let mut ticker = interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Set after a transient failure; flushes are skipped until it passes
        let mut backoff_until: Option<Instant> = None;

        loop {
            let trigger = tokio::select! {
                _ = ticker.tick() => "interval",
                _ = self.shared.flush_signal.notified() => "high_water",
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            };

            if let Some(until) = backoff_until {
                if Instant::now() < until {
                    debug!(trigger, "Flush gated by backoff");
                    continue;
                }
                backoff_until = None;
            }

            let outcome = self.flush().instrument(flush_span!(trigger)).await;
            if let FlushOutcome::Retrying { delay, .. } = outcome {
                backoff_until = Some(Instant::now() + delay);
            } else {
                // The eager trigger is level-based: one Notify permit can
                // cover a backlog of several batches, so re-arm while the
                // queue is still at or above the high-water mark
                let len = self.shared.queue.lock().unwrap().len();
                if len >= self.high_water_mark {
                    self.shared.flush_signal.notify_one();
                }
            }
        }

        self.final_flush().await;

        info!("Batch scheduler stopped");
    }

    /// Drain one batch and hand it to the sink
    async fn flush(&self) -> FlushOutcome {
        let mut batch = {
            let mut queue = self.shared.queue.lock().unwrap();
            queue.drain_batch(self.batch_size)
        };

        let span = tracing::Span::current();
        if batch.is_empty() {
            span.record("outcome", "empty");
            return FlushOutcome::Empty;
        }

        let batch_size = batch.len();
        span.record("batch_size", batch_size as u64);

        for queued in &mut batch {
            queued.attempts += 1;
        }

        let timer = Timer::start("deliver_batch");
        match self.sink.deliver(&batch).await {
            Ok(()) => {
                let duration = timer.stop();
                span.record("outcome", "delivered");
                span.record("duration_ms", duration.as_millis() as u64);
                self.shared.counters.record_delivered(batch_size as u64);
                debug!(batch_size, "Batch delivered");
                FlushOutcome::Delivered(batch_size)
            },
            Err(e) if e.is_retryable() => {
                timer.stop();
                span.record("outcome", "retrying");
                self.shared.counters.record_retry();

                let max_attempts = batch.iter().map(|q| q.attempts).max().unwrap_or(1);
                let delay = self.backoff_delay(max_attempts);

                let requeue = {
                    let mut queue = self.shared.queue.lock().unwrap();
                    queue.requeue_front(batch, self.retry_ceiling)
                };
                self.shared.counters.record_dropped(requeue.dropped as u64);
                self.shared.counters.record_evicted(requeue.evicted as u64);

                let requeued = batch_size - requeue.dropped;
                warn!(
                    error = %e,
                    requeued,
                    dropped = requeue.dropped,
                    delay_ms = delay.as_millis() as u64,
                    "Transient delivery failure; batch requeued"
                );
                FlushOutcome::Retrying {
                    requeued,
                    dropped: requeue.dropped,
                    delay,
                }
            },
            Err(e) => {
                timer.stop();
                span.record("outcome", "dropped");
                self.shared.counters.record_dropped(batch_size as u64);
                log_error!(e, "Non-retryable delivery failure; batch dropped");
                FlushOutcome::Dropped(batch_size)
            },
        }
    }

    /// One best-effort flush of whatever remains; never retried
    ///
    /// Only the delivery attempt runs under the shutdown deadline, so the
    /// loss accounting still happens when the deadline expires mid-send.
    async fn final_flush(&self) {
        let mut batch = {
            let mut queue = self.shared.queue.lock().unwrap();
            queue.drain_batch(usize::MAX)
        };

        if batch.is_empty() {
            return;
        }

        for queued in &mut batch {
            queued.attempts += 1;
        }

        let batch_size = batch.len();
        match tokio::time::timeout(self.shutdown_deadline, self.sink.deliver(&batch)).await {
            Ok(Ok(())) => {
                self.shared.counters.record_delivered(batch_size as u64);
                info!(batch_size, "Final flush delivered");
            },
            Ok(Err(e)) => {
                self.shared.counters.record_dropped(batch_size as u64);
                warn!(
                    error = %e,
                    lost = batch_size,
                    "Final flush failed; residual events lost"
                );
            },
            Err(_) => {
                self.shared.counters.record_dropped(batch_size as u64);
                warn!(
                    deadline_ms = self.shutdown_deadline.as_millis() as u64,
                    lost = batch_size,
                    "Shutdown flush deadline exceeded; residual events lost"
                );
            },
        }
    }

    /// Exponential backoff: min(base * 2^attempts, max)
    fn backoff_delay(&self, attempts: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_config, MockSink};

    fn test_scheduler(config: &Config) -> BatchScheduler {
        let shared = Arc::new(PipelineShared::new(config));
        BatchScheduler::new(shared, Arc::new(MockSink::new()), config)
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let mut config = test_config();
        config.retry.base_delay_ms = 1000;
        config.retry.max_delay_ms = 30000;
        let scheduler = test_scheduler(&config);

        assert_eq!(scheduler.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(scheduler.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(scheduler.backoff_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_capped_at_max_delay() {
        let mut config = test_config();
        config.retry.base_delay_ms = 1000;
        config.retry.max_delay_ms = 30000;
        let scheduler = test_scheduler(&config);

        assert_eq!(scheduler.backoff_delay(10), Duration::from_secs(30));
        assert_eq!(scheduler.backoff_delay(40), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_flush_on_empty_queue_skips_delivery() {
        let config = test_config();
        let shared = Arc::new(PipelineShared::new(&config));
        let sink = Arc::new(MockSink::new());
        let scheduler = BatchScheduler::new(Arc::clone(&shared), sink.clone(), &config);

        assert_eq!(scheduler.flush().await, FlushOutcome::Empty);
        assert!(sink.delivered_batches().is_empty());
    }
}
