//! Transmission error types
//!
//! Construction is the only fallible surface: intake never fails visibly,
//! and every event-level failure becomes an outcome instead of an error.

use thiserror::Error;

/// Errors surfaced when building a transmission
#[derive(Debug, Error)]
pub enum TransmissionError {
    /// Invalid or rejected configuration
    #[error(transparent)]
    Config(#[from] nectar_config::ConfigError),

    /// The HTTP client failed to initialize
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The transmission must be built inside an async runtime so it can
    /// spawn its timer and send workers
    #[error("no async runtime available; build the transmission inside a tokio runtime")]
    NoRuntime,
}
