//! Sink counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by the producer side and the flush worker.
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Events accepted into the queue.
    pub events_received: AtomicU64,

    /// Events dropped (queue full or sink closed).
    pub events_dropped: AtomicU64,

    /// Flushes handed to the executor.
    pub batches_flushed: AtomicU64,

    /// Rows the executor reported as written.
    pub rows_written: AtomicU64,

    /// Flushes that failed and were discarded.
    pub flush_failures: AtomicU64,

    /// Events rejected while building rows.
    pub rows_rejected: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance.
    pub const fn new() -> Self {
        Self {
            events_received: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
            rows_rejected: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn event_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn batch_written(&self, rows: u64) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn flush_failed(&self) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn rows_rejected(&self, count: u64) {
        self.rows_rejected.fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            rows_rejected: self.rows_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub events_dropped: u64,
    pub batches_flushed: u64,
    pub rows_written: u64,
    pub flush_failures: u64,
    pub rows_rejected: u64,
}
