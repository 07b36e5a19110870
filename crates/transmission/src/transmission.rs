//! The transmission capability and the batching implementation
//!
//! A transmission accepts validated events and owes every one of them an
//! outcome. The batching [`BaseTransmission`] is the real thing; the
//! variants under [`crate::sinks`] swap the wire for a no-op, a list, or
//! stdout while keeping the same surface.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use nectar_config::{Options, TransmissionKind};

use crate::dispatch::Dispatcher;
use crate::error::TransmissionError;
use crate::event::ValidatedEvent;
use crate::metrics::{MetricsSnapshot, TransmissionMetrics};
use crate::response::{Response, ResponseCallback};
use crate::sampler::Sampler;
use crate::sender::HttpSender;
use crate::sinks::{ConsoleTransmission, MockTransmission, NullTransmission};

/// Capability every transmission variant offers.
#[async_trait]
pub trait Transmission: Send + Sync {
    /// Submit an event through the sampling gate. Never blocks.
    fn send(&self, event: ValidatedEvent);

    /// Submit an event that was already sampled upstream. Never blocks.
    fn send_presampled(&self, event: ValidatedEvent);

    /// Wait until everything queued and in flight has drained
    async fn flush(&self);

    /// Counters for this transmission, when it keeps any
    fn metrics(&self) -> Option<MetricsSnapshot> {
        None
    }
}

/// The batching HTTP transmission.
pub struct BaseTransmission {
    dispatcher: Arc<Dispatcher>,
    sampler: Sampler,
    callback: ResponseCallback,
    metrics: Arc<TransmissionMetrics>,
}

impl BaseTransmission {
    /// Build a transmission with the default random source.
    ///
    /// Must run inside a tokio runtime; the dispatcher spawns its timer
    /// and send workers on it.
    pub fn new(options: &Options, callback: ResponseCallback) -> Result<Self, TransmissionError> {
        Self::with_sampler(options, callback, Sampler::new())
    }

    /// Build a transmission with an injected sampler
    pub fn with_sampler(
        options: &Options,
        callback: ResponseCallback,
        sampler: Sampler,
    ) -> Result<Self, TransmissionError> {
        let runtime = Handle::try_current().map_err(|_| TransmissionError::NoRuntime)?;
        let sender = Arc::new(HttpSender::new(options)?);
        let metrics = Arc::new(TransmissionMetrics::new());
        let dispatcher = Arc::new(Dispatcher::new(
            options,
            sender,
            Arc::clone(&callback),
            Arc::clone(&metrics),
            runtime,
        ));

        debug!(
            batch_size_trigger = options.batch_size_trigger,
            batch_time_trigger_ms = options.batch_time_trigger.as_millis() as u64,
            max_concurrent_batches = options.max_concurrent_batches,
            pending_work_capacity = options.pending_work_capacity,
            "transmission starting"
        );

        Ok(Self {
            dispatcher,
            sampler,
            callback,
            metrics,
        })
    }

    /// Whether nothing is queued or in flight
    pub fn is_idle(&self) -> bool {
        self.dispatcher.is_idle()
    }
}

#[async_trait]
impl Transmission for BaseTransmission {
    fn send(&self, event: ValidatedEvent) {
        self.metrics.record_received();
        if !self.sampler.should_send(event.sample_rate) {
            self.metrics.record_sampled();
            (self.callback)(vec![Response::sampled(event.metadata)]);
            return;
        }
        self.dispatcher.enqueue(event);
    }

    fn send_presampled(&self, event: ValidatedEvent) {
        self.metrics.record_received();
        self.dispatcher.enqueue(event);
    }

    async fn flush(&self) {
        self.dispatcher.flush().await;

        let snapshot = self.metrics.snapshot();
        debug!(
            events_received = snapshot.events_received,
            events_sent = snapshot.events_sent,
            events_sampled = snapshot.events_sampled,
            events_overflowed = snapshot.events_overflowed,
            batches_sent = snapshot.batches_sent,
            send_errors = snapshot.send_errors,
            "transmission drained"
        );
    }

    fn metrics(&self) -> Option<MetricsSnapshot> {
        Some(self.metrics.snapshot())
    }
}

/// Build the transmission variant the options ask for.
///
/// The unknown-kind case is unrepresentable here; it fails earlier, when
/// the kind string is parsed into [`TransmissionKind`].
pub fn build_transmission(
    options: &Options,
    callback: ResponseCallback,
) -> Result<Arc<dyn Transmission>, TransmissionError> {
    match options.transmission {
        TransmissionKind::Base => Ok(Arc::new(BaseTransmission::new(options, callback)?)),
        TransmissionKind::Null => Ok(Arc::new(NullTransmission::new())),
        TransmissionKind::Mock => Ok(Arc::new(MockTransmission::new())),
        TransmissionKind::Console | TransmissionKind::Stdout => {
            Ok(Arc::new(ConsoleTransmission::new()))
        }
        TransmissionKind::Writer => {
            warn!("transmission kind 'writer' is deprecated, use 'console'");
            Ok(Arc::new(ConsoleTransmission::new()))
        }
    }
}
