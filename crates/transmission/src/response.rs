//! Per-event outcomes
//!
//! Every event handed to the transmission produces exactly one [`Response`],
//! whatever its fate: sampled out, dropped on overflow, failed to encode,
//! or carried to the ingest service and answered per event. Outcomes are
//! delivered in groups to the response callback from the worker context
//! that produced them.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// What went wrong with one event, when anything did.
#[derive(Debug, Clone, Error)]
pub enum ResponseError {
    /// The sampling gate dropped the event locally
    #[error("event dropped due to sampling")]
    Sampled,

    /// The queue was at capacity and the event was dropped
    #[error("queue overflow")]
    Overflow,

    /// The event failed to serialize; the rest of its batch proceeded
    #[error("failed to encode event: {0}")]
    Encode(String),

    /// The ingest service rejected this event individually (2xx batch
    /// response with a per-event error)
    #[error("{0}")]
    Server(String),

    /// The whole request failed with a non-2xx status
    #[error("http error: status {0}")]
    Http(u16),

    /// The whole request failed below HTTP: connect, DNS, TLS, or the
    /// per-request deadline
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable cause
        message: String,
        /// True when the per-request deadline expired
        timeout: bool,
    },
}

impl ResponseError {
    /// Whether this failure was caused by the per-request deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { timeout: true, .. })
    }
}

/// Outcome of one submitted event.
#[derive(Debug, Clone)]
pub struct Response {
    /// Caller metadata, returned verbatim
    pub metadata: Value,

    /// HTTP status for this event when a request completed
    pub status_code: Option<u16>,

    /// Wall-clock time from request start to response receipt; zero for
    /// events dropped before any request
    pub duration: Duration,

    /// The failure, if any
    pub error: Option<ResponseError>,
}

impl Response {
    /// Outcome for an event dropped by the sampling gate
    pub fn sampled(metadata: Value) -> Self {
        Self {
            metadata,
            status_code: None,
            duration: Duration::ZERO,
            error: Some(ResponseError::Sampled),
        }
    }

    /// Outcome for an event dropped on queue overflow
    pub fn overflow(metadata: Value) -> Self {
        Self {
            metadata,
            status_code: None,
            duration: Duration::ZERO,
            error: Some(ResponseError::Overflow),
        }
    }

    /// Outcome for an event that failed to encode
    pub fn encode_failure(metadata: Value, message: String, duration: Duration) -> Self {
        Self {
            metadata,
            status_code: None,
            duration,
            error: Some(ResponseError::Encode(message)),
        }
    }

    /// Whether the event was accepted end to end
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Callback receiving outcome groups.
///
/// Invoked from send-worker contexts; with more than one concurrent batch
/// the callback runs concurrently with itself.
pub type ResponseCallback = Arc<dyn Fn(Vec<Response>) + Send + Sync>;
