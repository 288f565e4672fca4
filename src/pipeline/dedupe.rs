//! Sliding-window deduplication of interaction events
//!
//! UI double-firing (a click handler plus a synthetic accessibility event)
//! must not be recorded twice, but legitimate rapid distinct page views
//! must always be recorded. Page views therefore bypass the window
//! entirely.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::{DedupeKey, Event};

/// Suppresses repeated emission of semantically identical events
/// within a sliding window
#[derive(Debug)]
pub struct Deduplicator {
    window: Duration,
    last_accepted: HashMap<DedupeKey, Instant>,
}

impl Deduplicator {
    /// Create a deduplicator with the given window for interaction events
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: HashMap::new(),
        }
    }

    /// Decide whether an event should be emitted
    ///
    /// Accepts the event when no identical dedupe key was accepted within
    /// the window preceding it; acceptance updates the stored timestamp.
    /// Stale entries are pruned lazily on each lookup to bound the map.
    pub fn should_emit(&mut self, event: &Event) -> bool {
        // Page views are never deduplicated (window zero)
        if event.kind.is_page_view() {
            return true;
        }

        if self.window.is_zero() {
            return true;
        }

        let now = event.recorded_at;
        self.prune(now);

        let key = event.dedupe_key();
        match self.last_accepted.get(&key) {
            Some(last) if now.saturating_duration_since(*last) < self.window => false,
            _ => {
                self.last_accepted.insert(key, now);
                true
            },
        }
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.last_accepted.len()
    }

    fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.last_accepted
            .retain(|_, last| now.saturating_duration_since(*last) < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, EventKind};

    fn cart_add(id: &str) -> Event {
        Event::new(
            EventKind::ProductInteraction(Action::CartAdd),
            id,
            id,
            "session-1",
        )
    }

    #[test]
    fn test_duplicate_interaction_suppressed() {
        let mut dedupe = Deduplicator::new(Duration::from_secs(2));

        assert!(dedupe.should_emit(&cart_add("sku-42")));
        assert!(!dedupe.should_emit(&cart_add("sku-42")));
    }

    #[test]
    fn test_distinct_subjects_both_accepted() {
        let mut dedupe = Deduplicator::new(Duration::from_secs(2));

        assert!(dedupe.should_emit(&cart_add("sku-1")));
        assert!(dedupe.should_emit(&cart_add("sku-2")));
    }

    #[test]
    fn test_distinct_actions_both_accepted() {
        let mut dedupe = Deduplicator::new(Duration::from_secs(2));

        let view = Event::new(
            EventKind::ProductInteraction(Action::View),
            "sku-1",
            "sku-1",
            "session-1",
        );
        let click = Event::new(
            EventKind::ProductInteraction(Action::Click),
            "sku-1",
            "sku-1",
            "session-1",
        );

        assert!(dedupe.should_emit(&view));
        assert!(dedupe.should_emit(&click));
    }

    #[test]
    fn test_page_views_always_accepted() {
        let mut dedupe = Deduplicator::new(Duration::from_secs(2));

        for _ in 0..10 {
            assert!(dedupe.should_emit(&Event::page_view("session-1")));
        }
        assert_eq!(dedupe.tracked_keys(), 0);
    }

    #[test]
    fn test_zero_window_accepts_everything() {
        let mut dedupe = Deduplicator::new(Duration::ZERO);

        assert!(dedupe.should_emit(&cart_add("sku-42")));
        assert!(dedupe.should_emit(&cart_add("sku-42")));
    }

    #[test]
    fn test_accepted_again_after_window_elapses() {
        let mut dedupe = Deduplicator::new(Duration::from_millis(20));

        assert!(dedupe.should_emit(&cart_add("sku-42")));
        std::thread::sleep(Duration::from_millis(30));
        assert!(dedupe.should_emit(&cart_add("sku-42")));
    }

    #[test]
    fn test_stale_entries_pruned_on_lookup() {
        let mut dedupe = Deduplicator::new(Duration::from_millis(20));

        for i in 0..5 {
            assert!(dedupe.should_emit(&cart_add(&format!("sku-{}", i))));
        }
        assert_eq!(dedupe.tracked_keys(), 5);

        std::thread::sleep(Duration::from_millis(30));
        assert!(dedupe.should_emit(&cart_add("sku-new")));
        assert_eq!(dedupe.tracked_keys(), 1);
    }
}
