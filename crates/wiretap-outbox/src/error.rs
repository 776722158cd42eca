//! Outbox error types.

use thiserror::Error;

/// Outbox error type.
///
/// These never reach the instrumented application: delivery errors are
/// logged by the worker and the record is discarded.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// HTTP transport error (connect, DNS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector answered with a non-2xx status
    #[error("Collector rejected capture: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker thread could not be spawned
    #[error("Failed to spawn transport worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The transport panicked while delivering
    #[error("Transport panicked: {0}")]
    Panicked(String),
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;
