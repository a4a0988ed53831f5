//! Per-port delivery counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for a single viewer port, shared by the service and the viewer
#[derive(Debug, Default)]
pub struct PortMetrics {
    /// Messages waiting in the port queue (approximate)
    queue_len: AtomicUsize,
    /// Messages handed to the port queue
    delivered_count: AtomicU64,
    /// Messages dropped because the queue was full
    dropped_count: AtomicU64,
}

impl PortMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    pub fn inc_delivered_count(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> PortMetricsSnapshot {
        PortMetricsSnapshot {
            queue_len: self.queue_len(),
            delivered_count: self.delivered_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Snapshot of port metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortMetricsSnapshot {
    pub queue_len: usize,
    pub delivered_count: u64,
    pub dropped_count: u64,
}
