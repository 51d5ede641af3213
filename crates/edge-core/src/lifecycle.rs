//! Request lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases for a streamed page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Request received, nothing written yet.
    Start,
    /// Shell HTML has been flushed to the client.
    ShellSent,
    /// A named slot has been filled.
    SlotFilled(String),
    /// Closing markup written.
    Completion,
}

/// Timing marks for one request, relative to its start.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context starting now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark. Re-marking overwrites.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Mark the moment a query was issued.
    pub fn mark_query_issued(&mut self, key: &str) {
        self.mark(&format!("query_{}_issued", key));
    }

    /// Mark the moment a query settled (success or failure).
    pub fn mark_query_settled(&mut self, key: &str) {
        self.mark(&format!("query_{}_settled", key));
    }

    /// Mark a slot fill.
    pub fn mark_slot_filled(&mut self, slot: &str) {
        self.mark(&format!("slot_{}_filled", slot));
    }

    /// Elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Offset of a named mark from start.
    pub fn offset_of(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Time to shell flush.
    pub fn time_to_shell(&self) -> Option<Duration> {
        self.offset_of("shell_sent")
    }

    /// Time until the first slot was filled.
    pub fn time_to_first_fill(&self) -> Option<Duration> {
        self.marks
            .iter()
            .filter(|(k, _)| k.starts_with("slot_") && k.ends_with("_filled"))
            .map(|(_, t)| t.duration_since(self.start))
            .min()
    }

    /// How long a query took from issue to settle.
    pub fn query_latency(&self, key: &str) -> Option<Duration> {
        let issued = self.marks.get(&format!("query_{}_issued", key))?;
        let settled = self.marks.get(&format!("query_{}_settled", key))?;
        Some(settled.duration_since(*issued))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_marks_are_none() {
        let timing = TimingContext::new();
        assert!(timing.time_to_shell().is_none());
        assert!(timing.time_to_first_fill().is_none());
        assert!(timing.query_latency("product:1").is_none());
    }

    #[test]
    fn test_query_latency_needs_both_marks() {
        let mut timing = TimingContext::new();
        timing.mark_query_issued("sizes:1");
        assert!(timing.query_latency("sizes:1").is_none());

        timing.mark_query_settled("sizes:1");
        assert!(timing.query_latency("sizes:1").is_some());
    }

    #[test]
    fn test_first_fill_is_earliest_slot() {
        let mut timing = TimingContext::new();
        timing.mark_slot_filled("reviews");
        let first = timing.offset_of("slot_reviews_filled");
        timing.mark_slot_filled("sizes");

        assert_eq!(timing.time_to_first_fill(), first);
    }
}
