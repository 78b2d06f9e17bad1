//! Sink and collector metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Pending put requests
    queue_len: AtomicUsize,
    /// Successful puts
    put_count: AtomicU64,
    /// Events applied by successful puts
    event_count: AtomicU64,
    /// Failed puts
    failure_count: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn put_count(&self) -> u64 {
        self.put_count.load(Ordering::Relaxed)
    }

    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }

    /// Record a successful put of `events` events
    pub fn inc_put_count(&self, events: usize) {
        self.put_count.fetch_add(1, Ordering::Relaxed);
        self.event_count.fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            put_count: self.put_count(),
            event_count: self.event_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub put_count: u64,
    pub event_count: u64,
    pub failure_count: u64,
}

/// Batch-level counters for one collector
#[derive(Debug, Default)]
pub struct CollectorMetrics {
    batches_accepted: AtomicU64,
    batches_rejected: AtomicU64,
    batches_failed: AtomicU64,
    events_accepted: AtomicU64,
}

impl CollectorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_accepted(&self, events: usize) {
        self.batches_accepted.fetch_add(1, Ordering::Relaxed);
        self.events_accepted
            .fetch_add(events as u64, Ordering::Relaxed);
    }

    /// Batch failed to decode
    pub fn inc_rejected(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Batch decoded but at least one sink failed
    pub fn inc_failed(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CollectorSnapshot {
        CollectorSnapshot {
            batches_accepted: self.batches_accepted.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            events_accepted: self.events_accepted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorSnapshot {
    pub batches_accepted: u64,
    pub batches_rejected: u64,
    pub batches_failed: u64,
    pub events_accepted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_metrics_snapshot() {
        let metrics = SinkMetrics::new();
        metrics.inc_put_count(3);
        metrics.inc_put_count(2);
        metrics.inc_failure_count();

        let snap = metrics.snapshot();
        assert_eq!(snap.put_count, 2);
        assert_eq!(snap.event_count, 5);
        assert_eq!(snap.failure_count, 1);
    }

    #[test]
    fn test_collector_metrics_snapshot() {
        let metrics = CollectorMetrics::new();
        metrics.inc_accepted(4);
        metrics.inc_rejected();
        metrics.inc_failed();

        assert_eq!(
            metrics.snapshot(),
            CollectorSnapshot {
                batches_accepted: 1,
                batches_rejected: 1,
                batches_failed: 1,
                events_accepted: 4,
            }
        );
    }
}
