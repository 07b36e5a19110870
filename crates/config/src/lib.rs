//! Nectar Configuration
//!
//! Options for the nectar telemetry shipper with sensible defaults.
//! A minimal configuration only needs a write key - everything else
//! (batching triggers, concurrency, capacities, timeouts) defaults to
//! values that work for a typical deployment.
//!
//! # Example
//!
//! ```
//! use nectar_config::{Options, TransmissionKind};
//!
//! let options = Options::new("my-write-key")
//!     .with_dataset("production")
//!     .validate()
//!     .unwrap();
//!
//! assert_eq!(options.transmission, TransmissionKind::Base);
//! ```
//!
//! Options also deserialize from TOML with the same defaults applied to
//! omitted fields; durations accept humantime strings ("100ms", "60s").

mod error;
mod options;

pub use error::{ConfigError, Result};
pub use options::{DEFAULT_API_HOST, DEFAULT_DATASET, Options, TransmissionKind};
