//! Wire models for the collector API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;
use uuid::Uuid;

/// Header map as stored and returned by the collector.
pub type Headers = BTreeMap<String, String>;

/// Library name recorded when a client omits `meta`.
pub const UNKNOWN: &str = "unknown";

/// Incoming capture, as posted by a client to `/api/capture`.
#[derive(Debug, Clone, Deserialize)]
pub struct CapturePayload {
    #[serde(default)]
    pub id: Option<String>,
    /// Client-side capture time; the collector stamps its own receive time.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    pub request: IncomingRequest,
    pub response: IncomingResponse,
    #[serde(default)]
    pub meta: IncomingMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingResponse {
    pub status_code: u16,
    pub headers: Headers,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IncomingMeta {
    pub library: String,
    pub rust_version: String,
    pub wiretap_version: String,
}

impl Default for IncomingMeta {
    fn default() -> Self {
        Self {
            library: UNKNOWN.to_string(),
            rust_version: String::new(),
            wiretap_version: String::new(),
        }
    }
}

/// Body of a successful ingestion response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureAck {
    pub status: String,
}

impl CaptureAck {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// A capture as held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCapture {
    pub id: String,
    pub received_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub method: String,
    pub url: String,
    pub host: String,
    pub request_headers: Headers,
    pub request_body: Option<String>,
    pub request_body_size: usize,
    pub status_code: u16,
    pub response_headers: Headers,
    pub response_body: Option<String>,
    pub response_body_size: usize,
    pub library: String,
}

impl StoredCapture {
    /// Normalize a payload received at `received_at`.
    ///
    /// Missing ids get a fresh UUID, the method is uppercased and the host
    /// is taken from the URL (`"unknown"` when it has none).
    pub fn from_payload(payload: CapturePayload, received_at: DateTime<Utc>) -> Self {
        let CapturePayload {
            id,
            duration_ms,
            request,
            response,
            meta,
            ..
        } = payload;

        Self {
            id: id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            received_at,
            duration_ms,
            method: request.method.to_uppercase(),
            host: host_of(&request.url),
            url: request.url,
            request_headers: request.headers,
            request_body: request.body,
            request_body_size: request.body_size,
            status_code: response.status_code,
            response_headers: response.headers,
            response_body: response.body,
            response_body_size: response.body_size,
            library: meta.library,
        }
    }

    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            id: self.id.clone(),
            timestamp: self.received_at,
            method: self.method.clone(),
            url: self.url.clone(),
            host: self.host.clone(),
            status_code: self.status_code,
            duration_ms: self.duration_ms,
        }
    }

    pub fn detail(&self) -> RequestDetail {
        RequestDetail {
            summary: self.summary(),
            library: self.library.clone(),
            request_headers: self.request_headers.clone(),
            request_body: self.request_body.clone(),
            request_body_size: self.request_body_size,
            response_headers: self.response_headers.clone(),
            response_body: self.response_body.clone(),
            response_body_size: self.response_body_size,
        }
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Row of `GET /api/requests`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestSummary {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub host: String,
    pub status_code: u16,
    pub duration_ms: u64,
}

/// Body of `GET /api/requests/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub summary: RequestSummary,
    pub library: String,
    pub request_headers: Headers,
    pub request_body: Option<String>,
    pub request_body_size: usize,
    pub response_headers: Headers,
    pub response_body: Option<String>,
    pub response_body_size: usize,
}

/// Query string of `GET /api/requests`.
///
/// Empty strings and a zero status are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub host: Option<String>,
    pub method: Option<String>,
    pub status: Option<u16>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: usize = 50;
/// Largest page size a client may request.
pub const MAX_LIST_LIMIT: usize = 200;

impl ListQuery {
    /// Effective page size.
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT)
    }

    /// Whether `capture` passes every filter.
    pub fn matches(&self, capture: &StoredCapture) -> bool {
        if let Some(host) = non_empty(&self.host) {
            if capture.host != host {
                return false;
            }
        }
        if let Some(method) = non_empty(&self.method) {
            if !capture.method.eq_ignore_ascii_case(method) {
                return false;
            }
        }
        if let Some(status) = self.status.filter(|status| *status != 0) {
            if capture.status_code != status {
                return false;
            }
        }
        if let Some(search) = non_empty(&self.search) {
            if !capture.url.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
