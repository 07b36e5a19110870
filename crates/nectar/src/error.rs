//! Client error types

use thiserror::Error;

/// Errors surfaced when building or flushing a client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid or rejected configuration
    #[error(transparent)]
    Config(#[from] nectar_config::ConfigError),

    /// The transmission failed to initialize
    #[error(transparent)]
    Transmission(#[from] nectar_transmission::TransmissionError),
}
