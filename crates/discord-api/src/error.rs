//! Error types for the command layer and its configuration.

use crate::transport::TransportError;
use resource_marshal::MarshalError;
use thiserror::Error;

/// Errors returned by the API clients.
///
/// Validation variants are raised before any payload is built or sent.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A path parameter such as `channel_id` was empty.
    #[error("Missing required id: {0}")]
    MissingId(&'static str),

    #[error("Cannot send an empty message: missing content")]
    EmptyContent,

    #[error("Content length {len} reaches the {max} character threshold")]
    ContentTooLong { len: usize, max: usize },

    #[error("Nonce length {len} exceeds {max} characters")]
    NonceTooLong { len: usize, max: usize },

    #[error("Marshaling error: {0}")]
    Marshal(#[from] MarshalError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl CommandError {
    /// True for errors raised by input validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CommandError::MissingId(_)
                | CommandError::EmptyContent
                | CommandError::ContentTooLong { .. }
                | CommandError::NonceTooLong { .. }
        )
    }
}

/// Errors loading a [`ClientConfig`](crate::config::ClientConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
