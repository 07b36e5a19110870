//! Null transmission - discards all events
//!
//! Used when sending is disabled and as a sink for benchmarking intake
//! without any I/O. Events are counted and dropped; no outcomes are
//! produced.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::event::ValidatedEvent;
use crate::transmission::Transmission;

/// Transmission that drops every event
#[derive(Debug, Default)]
pub struct NullTransmission {
    discarded: AtomicU64,
}

impl NullTransmission {
    /// Create a null transmission
    pub fn new() -> Self {
        Self::default()
    }

    /// How many events were discarded
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transmission for NullTransmission {
    fn send(&self, _event: ValidatedEvent) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    fn send_presampled(&self, _event: ValidatedEvent) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    async fn flush(&self) {}
}
