//! Bounded FIFO queue of pending events
//!
//! The queue prioritizes recency over completeness: when full, enqueueing
//! evicts the oldest entry instead of rejecting the newest. That is a
//! deliberate lossy-under-pressure policy for telemetry, not a defect.

use std::collections::VecDeque;
use std::time::Instant;

use crate::models::Event;

/// An event with the delivery metadata the queue attaches to it
///
/// The wrapped event is never mutated; only `attempts` changes, and only
/// on the delivery path.
#[derive(Debug, Clone)]
pub struct QueuedEvent {
    /// The recorded event
    pub event: Event,

    /// Delivery attempts so far
    pub attempts: u32,

    /// When the event entered the queue
    pub enqueued_at: Instant,
}

impl QueuedEvent {
    /// Wrap an event that just passed deduplication
    pub fn new(event: Event) -> Self {
        Self {
            event,
            attempts: 0,
            enqueued_at: Instant::now(),
        }
    }
}

/// Result of requeueing a failed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequeueOutcome {
    /// Events dropped because their attempts reached the retry ceiling
    pub dropped: usize,

    /// Events evicted to restore the capacity bound
    pub evicted: usize,
}

/// Ordered, bounded buffer of pending events
#[derive(Debug)]
pub struct EventQueue {
    items: VecDeque<QueuedEvent>,
    capacity: usize,
}

impl EventQueue {
    /// Create a queue bounded to `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The capacity bound
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an event, evicting and returning the oldest entry if the
    /// queue is at capacity
    pub fn enqueue(&mut self, event: Event) -> Option<QueuedEvent> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };

        self.items.push_back(QueuedEvent::new(event));
        evicted
    }

    /// Remove up to `max` events in FIFO order, leaving the rest in place
    pub fn drain_batch(&mut self, max: usize) -> Vec<QueuedEvent> {
        let count = max.min(self.items.len());
        self.items.drain(..count).collect()
    }

    /// Reinsert a previously drained batch at the front of the queue,
    /// preserving earliest-first ordering for retry
    ///
    /// Events whose `attempts` has reached `retry_ceiling` are dropped
    /// before reinsertion. If producers filled the queue while the batch
    /// was in flight, the oldest entries are evicted afterwards to keep
    /// the capacity invariant.
    pub fn requeue_front(
        &mut self,
        batch: Vec<QueuedEvent>,
        retry_ceiling: u32,
    ) -> RequeueOutcome {
        let mut outcome = RequeueOutcome::default();

        let survivors: Vec<QueuedEvent> = batch
            .into_iter()
            .filter(|queued| {
                if queued.attempts >= retry_ceiling {
                    outcome.dropped += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        for queued in survivors.into_iter().rev() {
            self.items.push_front(queued);
        }

        while self.items.len() > self.capacity {
            self.items.pop_front();
            outcome.evicted += 1;
        }

        outcome
    }
}
