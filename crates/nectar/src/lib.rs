//! Nectar - client-side telemetry shipper
//!
//! Accepts validated, structured events and delivers them in batches to a
//! Honeycomb-style HTTP ingest endpoint. Key properties:
//!
//! - **Non-blocking intake**: submitting an event never waits on the
//!   network; overflow and sampling drops become outcomes, not errors
//! - **Batched delivery**: events are grouped by destination and cut into
//!   batches by size, by time, or on flush
//! - **One outcome per event**: every submission is answered exactly once
//!   through the response callback or the default response ring
//! - **Drain-and-swap flush**: `flush` waits for exactly the work that was
//!   pending when it was called while new events go to a fresh transmission
//!
//! # Example
//!
//! ```no_run
//! use nectar::{Client, Options, Payload, ValidatedEvent};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(Options::new("my-write-key").with_dataset("production"))?;
//!
//! client.send(ValidatedEvent {
//!     timestamp: chrono::Utc::now(),
//!     api_host: "https://api.honeycomb.io/".into(),
//!     write_key: "my-write-key".into(),
//!     dataset: "production".into(),
//!     sample_rate: 1,
//!     post_data: Payload::fields(
//!         json!({"route": "/home", "status": 200}).as_object().unwrap().clone(),
//!     ),
//!     metadata: json!({"id": 1}),
//! });
//!
//! client.flush().await?;
//! for outcome in client.responses().unwrap().drain() {
//!     println!("{:?} {:?}", outcome.status_code, outcome.error);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod ring;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use nectar_transmission::{NullTransmission, build_transmission};

pub use error::ClientError;
pub use nectar_config::{ConfigError, Options, TransmissionKind};
pub use nectar_transmission::{
    BaseTransmission, CustomPayload, Destination, FixedSource, MetricsSnapshot, Payload,
    RandomSource, Response, ResponseCallback, ResponseError, Sampler, Transmission,
    TransmissionError, ValidatedEvent,
};
pub use ring::ResponseRing;

/// The telemetry client.
///
/// Owns the active transmission and replaces it on flush so the awaiter
/// blocks on exactly the work that was pending at that instant.
pub struct Client {
    options: Options,
    transmission: RwLock<Arc<dyn Transmission>>,
    responses: Option<Arc<ResponseRing>>,
    callback: ResponseCallback,
}

impl Client {
    /// Build a client whose outcomes land in the default response ring
    ///
    /// # Errors
    ///
    /// Returns an error when the options fail validation or the
    /// transmission cannot be initialized.
    pub fn new(options: Options) -> Result<Self, ClientError> {
        let options = options.validate()?;
        let responses = Arc::new(ResponseRing::new(options.max_response_queue_size));
        let callback = responses.callback();
        let transmission = Self::build(&options, &callback)?;

        Ok(Self {
            options,
            transmission: RwLock::new(transmission),
            responses: Some(responses),
            callback,
        })
    }

    /// Build a client delivering outcomes to a caller-supplied callback
    /// instead of the ring
    pub fn with_response_callback(
        options: Options,
        callback: ResponseCallback,
    ) -> Result<Self, ClientError> {
        let options = options.validate()?;
        let transmission = Self::build(&options, &callback)?;

        Ok(Self {
            options,
            transmission: RwLock::new(transmission),
            responses: None,
            callback,
        })
    }

    fn build(
        options: &Options,
        callback: &ResponseCallback,
    ) -> Result<Arc<dyn Transmission>, ClientError> {
        if options.disabled {
            debug!("sending disabled, running a null transmission");
            return Ok(Arc::new(NullTransmission::new()));
        }
        Ok(build_transmission(options, Arc::clone(callback))?)
    }

    /// Submit an event through the sampling gate. Never blocks.
    pub fn send(&self, event: ValidatedEvent) {
        let transmission = Arc::clone(&*self.transmission.read());
        transmission.send(event);
    }

    /// Submit an event that was already sampled upstream. Never blocks.
    pub fn send_presampled(&self, event: ValidatedEvent) {
        let transmission = Arc::clone(&*self.transmission.read());
        transmission.send_presampled(event);
    }

    /// Drain everything pending at this instant.
    ///
    /// Detaches the current transmission, installs a fresh one for
    /// subsequent events, and waits for the detached one to finish its
    /// queued and in-flight work.
    ///
    /// # Errors
    ///
    /// Returns an error only when the replacement transmission cannot be
    /// initialized; the client then keeps its current transmission.
    pub async fn flush(&self) -> Result<(), ClientError> {
        let fresh = Self::build(&self.options, &self.callback)?;
        let detached = {
            let mut guard = self.transmission.write();
            std::mem::replace(&mut *guard, fresh)
        };
        detached.flush().await;
        Ok(())
    }

    /// The default response ring, absent when a custom callback is set
    pub fn responses(&self) -> Option<&ResponseRing> {
        self.responses.as_deref()
    }

    /// Counters of the active transmission, when it keeps any
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.transmission.read().metrics()
    }

    /// The validated options this client runs with
    pub fn options(&self) -> &Options {
        &self.options
    }
}
