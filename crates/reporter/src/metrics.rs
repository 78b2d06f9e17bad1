//! In-process reporter counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Reporter metrics
#[derive(Debug, Default)]
pub struct ReporterMetrics {
    /// Events accepted into the queue
    pub recorded: AtomicU64,

    /// Events discarded (queue full, client stopped, unencodable)
    pub dropped: AtomicU64,

    /// Successful flushes
    pub flushes: AtomicU64,

    /// Failed flushes
    pub flush_failures: AtomicU64,

    /// Events acknowledged by the collector
    pub events_sent: AtomicU64,

    /// Events currently buffered by the accumulator
    pub pending: AtomicUsize,
}

impl ReporterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_recorded(&self) {
        self.recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush(&self, events: usize) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.events_sent.fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn record_flush_failure(&self) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_pending(&self, len: usize) {
        self.pending.store(len, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ReporterSnapshot {
        ReporterSnapshot {
            recorded: self.recorded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            events_sent: self.events_sent.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReporterSnapshot {
    pub recorded: u64,
    pub dropped: u64,
    pub flushes: u64,
    pub flush_failures: u64,
    pub events_sent: u64,
    pub pending: usize,
}
