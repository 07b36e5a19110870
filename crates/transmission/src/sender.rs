//! HTTP batch sender
//!
//! One POST per encoded partition, with a hard per-request deadline. The
//! sender knows nothing about queues or outcomes: it reports what the wire
//! did and leaves per-event fan-out to the dispatcher.
//!
//! The [`BatchSender`] trait is the seam the dispatcher is tested through.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::trace;
use url::Url;

use nectar_config::Options;

use crate::event::Destination;

/// Base user-agent reported by this shipper
const USER_AGENT_BASE: &str = concat!("nectar-rs/", env!("CARGO_PKG_VERSION"));

/// Which header carries the user-agent string.
///
/// Browser platforms forbid overriding `User-Agent`, so wasm builds fall
/// back to a vendor header the ingest service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAgentHeader {
    /// The standard `User-Agent` header
    Standard,
    /// `X-Honeycomb-UserAgent`, for platforms that own `User-Agent`
    Compat,
}

impl UserAgentHeader {
    /// Header name on the wire
    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "User-Agent",
            Self::Compat => "X-Honeycomb-UserAgent",
        }
    }

    /// Default choice for the compile target
    pub fn for_target() -> Self {
        if cfg!(target_arch = "wasm32") {
            Self::Compat
        } else {
            Self::Standard
        }
    }
}

/// One element of a 2xx batch response, parallel to the encoded events
#[derive(Debug, Clone, Deserialize)]
pub struct EventStatus {
    /// Per-event HTTP-style status
    pub status: u16,

    /// Per-event error, null when the event was accepted
    #[serde(default)]
    pub err: Option<String>,
}

/// What the wire did with one partition
#[derive(Debug)]
pub enum BatchResult {
    /// 2xx with a well-formed per-event response array
    Accepted(Vec<EventStatus>),

    /// Non-2xx; applies uniformly to every event of the partition
    Rejected {
        /// The HTTP status
        status: u16,
    },

    /// The request never completed: connect/DNS/TLS failure, a malformed
    /// response body, or the per-request deadline
    Failed {
        /// Human-readable cause
        message: String,
        /// True when the deadline expired
        timeout: bool,
    },
}

/// Sends one encoded partition to its destination.
#[async_trait]
pub trait BatchSender: Send + Sync {
    /// POST `body` (a JSON array of `expected` events) to the destination
    /// batch endpoint and classify the result.
    async fn send_batch(
        &self,
        destination: &Destination,
        body: String,
        expected: usize,
    ) -> BatchResult;
}

/// The real sender, backed by reqwest.
pub struct HttpSender {
    client: reqwest::Client,
    timeout: Duration,
    user_agent: String,
    user_agent_header: UserAgentHeader,
}

impl HttpSender {
    /// Build a sender from client options
    pub fn new(options: &Options) -> Result<Self, reqwest::Error> {
        let user_agent = if options.user_agent_addition.is_empty() {
            USER_AGENT_BASE.to_string()
        } else {
            format!("{} {}", USER_AGENT_BASE, options.user_agent_addition)
        };

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            timeout: options.timeout,
            user_agent,
            user_agent_header: UserAgentHeader::for_target(),
        })
    }

    /// Override which header carries the user-agent
    #[must_use]
    pub fn with_user_agent_header(mut self, header: UserAgentHeader) -> Self {
        self.user_agent_header = header;
        self
    }

    /// Resolve the batch endpoint for a destination.
    ///
    /// The path is absolute, so any path on `api_host` is replaced and a
    /// trailing slash on the host makes no difference.
    pub fn batch_url(api_host: &str, dataset: &str) -> Result<Url, url::ParseError> {
        Url::parse(api_host)?.join(&format!("/1/batch/{dataset}"))
    }
}

#[async_trait]
impl BatchSender for HttpSender {
    async fn send_batch(
        &self,
        destination: &Destination,
        body: String,
        expected: usize,
    ) -> BatchResult {
        let url = match Self::batch_url(&destination.api_host, &destination.dataset) {
            Ok(url) => url,
            Err(e) => {
                return BatchResult::Failed {
                    message: format!("invalid api host '{}': {e}", destination.api_host),
                    timeout: false,
                };
            }
        };

        trace!(%url, bytes = body.len(), events = expected, "sending batch");

        let result = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header("X-Honeycomb-Team", &destination.write_key)
            .header(CONTENT_TYPE, "application/json")
            .header(self.user_agent_header.name(), &self.user_agent)
            .body(body)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                return BatchResult::Failed {
                    timeout: e.is_timeout(),
                    message: e.to_string(),
                };
            }
        };

        let status = response.status();
        if !status.is_success() {
            return BatchResult::Rejected {
                status: status.as_u16(),
            };
        }

        match response.json::<Vec<EventStatus>>().await {
            Ok(statuses) if statuses.len() == expected => BatchResult::Accepted(statuses),
            Ok(statuses) => BatchResult::Failed {
                message: format!(
                    "batch response has {} entries, expected {expected}",
                    statuses.len()
                ),
                timeout: false,
            },
            Err(e) => BatchResult::Failed {
                message: format!("invalid batch response body: {e}"),
                timeout: e.is_timeout(),
            },
        }
    }
}

#[cfg(test)]
#[path = "sender_test.rs"]
mod sender_test;
