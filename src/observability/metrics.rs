//! Pipeline counters
//!
//! - Counters only, monotonic
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use super::events::Event;

/// Outcome counters for every pipeline pass of one data access instance
#[derive(Debug, Default)]
pub struct AccessMetrics {
    completed: AtomicU64,
    intercepted: AtomicU64,
    cancelled: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl AccessMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a pipeline outcome; non-pipeline events are ignored
    pub fn record(&self, event: Event) {
        let counter = match event {
            Event::PipelineComplete => &self.completed,
            Event::PipelineIntercepted => &self.intercepted,
            Event::PipelineCancelled => &self.cancelled,
            Event::PipelineSkipped => &self.skipped,
            Event::PipelineFailed => &self.failed,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Passes that reached the driver and finished
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Passes failed by the driver
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            intercepted: self.intercepted.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`AccessMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub completed: u64,
    pub intercepted: u64,
    pub cancelled: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl MetricsSnapshot {
    /// All passes, whatever their outcome
    pub fn total(&self) -> u64 {
        self.completed + self.intercepted + self.cancelled + self.skipped + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = AccessMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_outcomes() {
        let metrics = AccessMetrics::new();
        metrics.record(Event::PipelineComplete);
        metrics.record(Event::PipelineComplete);
        metrics.record(Event::PipelineCancelled);
        metrics.record(Event::SchemaParsed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.completed, 2);
        assert_eq!(snapshot.cancelled, 1);
        assert_eq!(snapshot.total(), 3);
    }
}
