//! Collector error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Collector error type.
#[derive(Error, Debug)]
pub enum CollectorError {
    /// No capture with the requested id
    #[error("Request not found")]
    NotFound,

    /// A capture with this id is already stored
    #[error("Capture already exists: {0}")]
    Conflict(String),

    /// Invalid server configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Socket error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using CollectorError.
pub type CollectorResult<T> = Result<T, CollectorError>;

impl CollectorError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CollectorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
