//! Capture record wire types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header name to value mapping as it appears on the wire.
pub type Headers = BTreeMap<String, String>;

/// Compiler version the client was built with.
pub const RUST_VERSION: &str = env!("WIRETAP_RUSTC_VERSION");

/// Version of this crate, reported as the client software version.
pub const WIRETAP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One captured request/response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// Unique id (UUID v4).
    pub id: String,
    /// UTC capture time, `%Y-%m-%dT%H:%M:%SZ`.
    pub timestamp: String,
    /// Wall-clock duration of the underlying call.
    pub duration_ms: u64,
    pub request: RequestData,
    pub response: ResponseData,
    pub meta: ClientMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestData {
    /// Uppercased HTTP method.
    pub method: String,
    pub url: String,
    /// Headers after redaction.
    pub headers: Headers,
    pub body: Option<String>,
    /// Byte length of the original body.
    pub body_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    pub status_code: u16,
    pub headers: Headers,
    pub body: Option<String>,
    /// Byte length of the original body.
    pub body_size: usize,
}

/// Where a capture came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    /// Tag of the HTTP client library that produced the capture.
    pub library: String,
    pub rust_version: String,
    pub wiretap_version: String,
}

impl ClientMeta {
    /// Metadata for this build of the client.
    pub fn current(library: &str) -> Self {
        Self {
            library: library.to_string(),
            rust_version: RUST_VERSION.to_string(),
            wiretap_version: WIRETAP_VERSION.to_string(),
        }
    }
}
