//! Transmission counters
//!
//! Cheap relaxed atomics updated on the hot path, snapshotted for logging
//! and assertions. The base transmission logs the final snapshot when it
//! drains.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one transmission instance
#[derive(Debug, Default)]
pub struct TransmissionMetrics {
    /// Events handed to `send` or `send_presampled`
    events_received: AtomicU64,

    /// Events dropped by the sampling gate
    events_sampled: AtomicU64,

    /// Events dropped on queue overflow
    events_overflowed: AtomicU64,

    /// Events that failed to serialize at batch-encode time
    encode_failures: AtomicU64,

    /// Batch POSTs issued
    batches_sent: AtomicU64,

    /// Batch POSTs that failed (non-2xx or transport)
    send_errors: AtomicU64,

    /// Events delivered in a 2xx batch response
    events_sent: AtomicU64,
}

impl TransmissionMetrics {
    /// Create a zeroed metrics instance
    #[inline]
    pub const fn new() -> Self {
        Self {
            events_received: AtomicU64::new(0),
            events_sampled: AtomicU64::new(0),
            events_overflowed: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            batches_sent: AtomicU64::new(0),
            send_errors: AtomicU64::new(0),
            events_sent: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sampled(&self) {
        self.events_sampled.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_overflow(&self) {
        self.events_overflowed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_encode_failures(&self, count: u64) {
        self.encode_failures.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch_sent(&self, event_count: u64) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.events_sent.fetch_add(event_count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_send_error(&self) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_sampled: self.events_sampled.load(Ordering::Relaxed),
            events_overflowed: self.events_overflowed.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            events_sent: self.events_sent.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of transmission counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub events_sampled: u64,
    pub events_overflowed: u64,
    pub encode_failures: u64,
    pub batches_sent: u64,
    pub send_errors: u64,
    pub events_sent: u64,
}
