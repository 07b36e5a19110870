//! Client options
//!
//! Options cover the whole shipper: destination defaults, the sampling
//! rate, batching triggers, concurrency and capacity limits, and which
//! transmission variant to run. Every field has a sensible default; a
//! minimal configuration only needs a write key.
//!
//! # Example
//!
//! ```toml
//! write_key = "0123456789abcdef0123456789abcdef"
//! dataset = "production"
//!
//! # Cut a batch after 50 events or 100ms, whichever comes first
//! batch_size_trigger = 50
//! batch_time_trigger = "100ms"
//! ```

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Default ingest endpoint base URL
pub const DEFAULT_API_HOST: &str = "https://api.honeycomb.io/";

/// Dataset assigned when a non-classic key omits one
pub const DEFAULT_DATASET: &str = "unknown_dataset";

/// Length of a classic write key
const CLASSIC_KEY_LEN: usize = 32;

/// Which transmission variant the client runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransmissionKind {
    /// Batching HTTP transmission (the real one)
    #[default]
    Base,
    /// Discards every event
    Null,
    /// Appends events to an in-memory list, for tests
    Mock,
    /// Writes one JSON line per event to stdout
    Console,
    /// Alias for `console`
    Stdout,
    /// Deprecated alias for `console`
    Writer,
}

impl TransmissionKind {
    /// String form as it appears in configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Null => "null",
            Self::Mock => "mock",
            Self::Console => "console",
            Self::Stdout => "stdout",
            Self::Writer => "writer",
        }
    }

    /// Whether this kind is a deprecated alias
    pub fn is_deprecated(self) -> bool {
        matches!(self, Self::Writer)
    }
}

impl FromStr for TransmissionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "base" => Ok(Self::Base),
            "null" => Ok(Self::Null),
            "mock" => Ok(Self::Mock),
            "console" => Ok(Self::Console),
            "stdout" => Ok(Self::Stdout),
            "writer" => Ok(Self::Writer),
            other => Err(ConfigError::unknown_transmission(other)),
        }
    }
}

/// Options for the client and its transmission
///
/// # Example
///
/// ```
/// use nectar_config::Options;
///
/// let options = Options::new("0123456789abcdef0123456789abcdef")
///     .with_dataset("production")
///     .with_batch_size_trigger(100)
///     .validate()
///     .unwrap();
/// assert_eq!(options.dataset, "production");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Destination base URL for events that don't override it
    pub api_host: String,

    /// Authentication token; a 32-character key is treated as classic
    /// and requires an explicit dataset
    pub write_key: String,

    /// Default dataset; filled with "unknown_dataset" for non-classic keys
    pub dataset: String,

    /// Sampling rate: 1 sends every event, N sends roughly 1/N of them
    pub sample_rate: u32,

    /// Maximum events per batch
    pub batch_size_trigger: usize,

    /// Maximum delay before a non-full batch is cut
    #[serde(with = "humantime_serde")]
    pub batch_time_trigger: Duration,

    /// How many batches may be sent concurrently
    pub max_concurrent_batches: usize,

    /// Queue capacity; events beyond this are dropped with an overflow
    /// outcome rather than blocking the caller
    pub pending_work_capacity: usize,

    /// Capacity of the default response ring
    pub max_response_queue_size: usize,

    /// Per-request deadline for batch POSTs
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// When true the client runs a null transmission and sends nothing
    pub disabled: bool,

    /// Appended (trimmed) to the user-agent the sender reports
    pub user_agent_addition: String,

    /// Which transmission variant to run
    pub transmission: TransmissionKind,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            write_key: String::new(),
            dataset: String::new(),
            sample_rate: 1,
            batch_size_trigger: 50,
            batch_time_trigger: Duration::from_millis(100),
            max_concurrent_batches: 10,
            pending_work_capacity: 10_000,
            max_response_queue_size: 1_000,
            timeout: Duration::from_secs(60),
            disabled: false,
            user_agent_addition: String::new(),
            transmission: TransmissionKind::Base,
        }
    }
}

impl Options {
    /// Create options with the given write key and defaults for the rest
    pub fn new(write_key: impl Into<String>) -> Self {
        Self {
            write_key: write_key.into(),
            ..Default::default()
        }
    }

    /// Set the API host
    #[must_use]
    pub fn with_api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = api_host.into();
        self
    }

    /// Set the dataset
    #[must_use]
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self
    }

    /// Set the sample rate
    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the batch size trigger
    #[must_use]
    pub fn with_batch_size_trigger(mut self, batch_size_trigger: usize) -> Self {
        self.batch_size_trigger = batch_size_trigger;
        self
    }

    /// Set the batch time trigger
    #[must_use]
    pub fn with_batch_time_trigger(mut self, batch_time_trigger: Duration) -> Self {
        self.batch_time_trigger = batch_time_trigger;
        self
    }

    /// Set the maximum number of concurrent batches
    #[must_use]
    pub fn with_max_concurrent_batches(mut self, max_concurrent_batches: usize) -> Self {
        self.max_concurrent_batches = max_concurrent_batches;
        self
    }

    /// Set the pending work capacity
    #[must_use]
    pub fn with_pending_work_capacity(mut self, pending_work_capacity: usize) -> Self {
        self.pending_work_capacity = pending_work_capacity;
        self
    }

    /// Set the response ring capacity
    #[must_use]
    pub fn with_max_response_queue_size(mut self, max_response_queue_size: usize) -> Self {
        self.max_response_queue_size = max_response_queue_size;
        self
    }

    /// Set the per-request deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disable or enable sending entirely
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Set the user-agent addition
    #[must_use]
    pub fn with_user_agent_addition(mut self, addition: impl Into<String>) -> Self {
        self.user_agent_addition = addition.into();
        self
    }

    /// Set the transmission kind
    #[must_use]
    pub fn with_transmission(mut self, transmission: TransmissionKind) -> Self {
        self.transmission = transmission;
        self
    }

    /// Whether the write key is a classic (32-character) key
    pub fn is_classic_key(&self) -> bool {
        self.write_key.len() == CLASSIC_KEY_LEN
    }

    /// Validate and normalize the options
    ///
    /// Normalization fills the default dataset for non-classic keys,
    /// coerces a zero batch size trigger to one so the dispatcher can
    /// always make progress, and trims the user-agent addition.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty write key, an empty or relative API
    /// host, a zero sample rate, or a classic key without a dataset.
    pub fn validate(mut self) -> Result<Self> {
        if self.write_key.is_empty() {
            return Err(ConfigError::MissingWriteKey);
        }

        if self.api_host.is_empty() || !self.api_host.contains("://") {
            return Err(ConfigError::invalid_api_host(self.api_host));
        }

        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }

        if self.dataset.is_empty() {
            if self.is_classic_key() {
                return Err(ConfigError::ClassicKeyRequiresDataset);
            }
            self.dataset = DEFAULT_DATASET.to_string();
        }

        if self.batch_size_trigger == 0 {
            self.batch_size_trigger = 1;
        }

        self.user_agent_addition = self.user_agent_addition.trim().to_string();

        Ok(self)
    }
}
