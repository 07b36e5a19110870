//! Configuration error types

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when building or validating client options
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The write key is required for every destination
    #[error("write key is required and must be non-empty")]
    MissingWriteKey,

    /// Classic write keys always address an explicit dataset
    #[error("dataset is required when using a classic write key")]
    ClassicKeyRequiresDataset,

    /// The API host must be a non-empty absolute URL base
    #[error("api host must be a non-empty absolute URL, got '{host}'")]
    InvalidApiHost {
        /// The rejected value
        host: String,
    },

    /// Sample rate of zero would divide by zero in the sampling gate
    #[error("sample rate must be a positive number")]
    InvalidSampleRate,

    /// Unrecognized transmission kind in configuration
    #[error("unknown transmission kind '{kind}'")]
    UnknownTransmission {
        /// The rejected value
        kind: String,
    },
}

impl ConfigError {
    /// Create an InvalidApiHost error
    pub fn invalid_api_host(host: impl Into<String>) -> Self {
        Self::InvalidApiHost { host: host.into() }
    }

    /// Create an UnknownTransmission error
    pub fn unknown_transmission(kind: impl Into<String>) -> Self {
        Self::UnknownTransmission { kind: kind.into() }
    }
}
