//! Validated events and their wire encoding
//!
//! The transmission consumes events that have already been validated and
//! normalized by the caller-facing builder layer: timestamps are absolute,
//! the destination fields are non-empty, and the sample rate is positive.
//! Nothing here re-checks those invariants.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Destination of an event: one HTTP batch endpoint plus credentials.
///
/// Events sharing a destination are shipped together in one POST body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    /// Base URL of the ingest service
    pub api_host: String,

    /// Authentication token, sent as `X-Honeycomb-Team`
    pub write_key: String,

    /// Dataset name, part of the request path
    pub dataset: String,
}

/// Payload carried by an event, encoded to a JSON object at batch time.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// No payload; the wire object carries only `time` and `samplerate`
    #[default]
    Empty,

    /// Validated field map assembled by the builder layer
    Fields(Map<String, Value>),

    /// Caller-supplied value converted lazily at batch-encode time.
    ///
    /// Conversion may fail; the failing event is dropped from its batch
    /// body and reported with an encode-failure outcome while the rest of
    /// the batch proceeds.
    Custom(Arc<dyn CustomPayload>),
}

/// Lazily-encoded payload supplied by the caller.
pub trait CustomPayload: fmt::Debug + Send + Sync {
    /// Convert the payload to a JSON value
    fn to_json(&self) -> Result<Value, serde_json::Error>;
}

impl Payload {
    /// Build a payload from key/value fields
    pub fn fields(map: Map<String, Value>) -> Self {
        if map.is_empty() { Self::Empty } else { Self::Fields(map) }
    }

    /// Resolve the payload to a JSON value, or `None` when absent
    pub fn to_value(&self) -> Result<Option<Value>, serde_json::Error> {
        match self {
            Self::Empty => Ok(None),
            Self::Fields(map) => Ok(Some(Value::Object(map.clone()))),
            Self::Custom(custom) => custom.to_json().map(Some),
        }
    }
}

/// A validated, immutable event handed to the transmission.
#[derive(Debug, Clone)]
pub struct ValidatedEvent {
    /// Absolute event time, serialized under the wire key `time`
    pub timestamp: DateTime<Utc>,

    /// Base URL of the ingest service, non-empty
    pub api_host: String,

    /// Authentication token, non-empty
    pub write_key: String,

    /// Dataset name, non-empty
    pub dataset: String,

    /// Positive sampling rate; 1 means "send every event"
    pub sample_rate: u32,

    /// The payload body
    pub post_data: Payload,

    /// Opaque caller data, never transmitted, returned verbatim in the
    /// outcome for this event
    pub metadata: Value,
}

/// Wire shape of one event inside a batch body
#[derive(Serialize)]
struct WireEvent {
    time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    samplerate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl ValidatedEvent {
    /// The destination triple this event is grouped by
    pub fn destination(&self) -> Destination {
        Destination {
            api_host: self.api_host.clone(),
            write_key: self.write_key.clone(),
            dataset: self.dataset.clone(),
        }
    }

    /// Encode this event as one JSON object of a batch body.
    ///
    /// `samplerate` is omitted when 1, `data` when absent. Fails only when
    /// a custom payload refuses to convert.
    pub fn wire_json(&self) -> Result<String, serde_json::Error> {
        let wire = WireEvent {
            time: self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            samplerate: (self.sample_rate > 1).then_some(self.sample_rate),
            data: self.post_data.to_value()?,
        };
        serde_json::to_string(&wire)
    }
}
