//! Client error types.

use thiserror::Error;
use wiretap_core::CoreError;
use wiretap_outbox::OutboxError;

/// Errors surfaced by [`init`](crate::init). Capturing itself never fails.
#[derive(Error, Debug)]
pub enum WiretapError {
    /// Invalid capture configuration
    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),

    /// The transport worker could not be started
    #[error("Transport error: {0}")]
    Transport(#[from] OutboxError),
}

/// Result type alias using WiretapError.
pub type WiretapResult<T> = Result<T, WiretapError>;
