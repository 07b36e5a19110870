//! Nectar Transmission
//!
//! The batching core of the nectar telemetry shipper. Validated events go
//! in; batched HTTP POSTs come out; every event gets exactly one outcome
//! back through the response callback, whatever happened to it.
//!
//! # Architecture
//!
//! ```text
//! send(event)
//!     │
//!     ▼
//! ┌─────────┐ drop ┌──────────────────────────────────────────┐
//! │ Sampler │─────▶│              response callback           │
//! └────┬────┘      └──────────────────────────────────────────┘
//!      ▼                    ▲                ▲
//! ┌───────────────┐ overflow│                │ per-event outcomes
//! │ Bounded queue │─────────┘                │
//! └──────┬────────┘                          │
//!        │ cut (size / time / flush)         │
//!        ▼                                   │
//! ┌────────────┐   ┌─────────────┐   ┌──────┴──────┐
//! │ Dispatcher │──▶│ Aggregator  │──▶│ HTTP sender │──▶ POST /1/batch/…
//! │ (N slots)  │   │ (partition) │   │ (deadline)  │
//! └────────────┘   └─────────────┘   └─────────────┘
//! ```
//!
//! The dispatcher owns all mutable state behind one mutex and cuts a
//! batch when the queue reaches `batch_size_trigger`, when the deferred
//! timer fires after `batch_time_trigger`, or when a flush is requested.
//! Each cut occupies one of `max_concurrent_batches` worker slots; inside
//! a slot, per-destination partitions are sent one after another.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nectar_config::Options;
//! use nectar_transmission::{BaseTransmission, Transmission};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let options = Options::new("my-write-key").validate()?;
//! let transmission = BaseTransmission::new(
//!     &options,
//!     Arc::new(|responses| {
//!         for response in responses {
//!             println!("event outcome: {:?}", response.error);
//!         }
//!     }),
//! )?;
//!
//! // ... transmission.send(event) from any thread ...
//! transmission.flush().await;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod dispatch;
mod error;
pub mod event;
pub mod metrics;
pub mod response;
pub mod sampler;
pub mod sender;
pub mod sinks;
mod transmission;

pub use error::TransmissionError;
pub use event::{CustomPayload, Destination, Payload, ValidatedEvent};
pub use metrics::{MetricsSnapshot, TransmissionMetrics};
pub use response::{Response, ResponseCallback, ResponseError};
pub use sampler::{FixedSource, RandomSource, Sampler, ThreadRngSource};
pub use sender::{BatchResult, BatchSender, EventStatus, HttpSender, UserAgentHeader};
pub use sinks::{ConsoleTransmission, MockTransmission, NullTransmission};
pub use transmission::{BaseTransmission, Transmission, build_transmission};
