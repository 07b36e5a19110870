//! Mock transmission - records events in memory
//!
//! For tests that want to assert on what was submitted without a wire or
//! a fixture server.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::event::ValidatedEvent;
use crate::transmission::Transmission;

/// Transmission that appends every event to a list
#[derive(Debug, Default)]
pub struct MockTransmission {
    events: Mutex<Vec<ValidatedEvent>>,
    presampled: AtomicU64,
    flushes: AtomicU64,
}

impl MockTransmission {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything submitted so far, in submission order
    pub fn events(&self) -> Vec<ValidatedEvent> {
        self.events.lock().clone()
    }

    /// How many events arrived through `send_presampled`
    pub fn presampled_count(&self) -> u64 {
        self.presampled.load(Ordering::Relaxed)
    }

    /// How many times `flush` was called
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transmission for MockTransmission {
    fn send(&self, event: ValidatedEvent) {
        self.events.lock().push(event);
    }

    fn send_presampled(&self, event: ValidatedEvent) {
        self.presampled.fetch_add(1, Ordering::Relaxed);
        self.events.lock().push(event);
    }

    async fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }
}
