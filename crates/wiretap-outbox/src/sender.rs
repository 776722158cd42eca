//! HTTP delivery of single captures to the collector.

use crate::{OutboxError, OutboxResult};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::debug;
use wiretap_core::CaptureRecord;

/// Path of the ingestion endpoint, relative to the collector base URL.
pub const CAPTURE_PATH: &str = "/api/capture";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Sender configuration.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Request timeout in seconds, covering connect through body.
    pub timeout_secs: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Something that can push one record to a collector.
///
/// Implementations are driven synchronously from the transport worker
/// thread; they may block up to their own timeout.
pub trait Delivery: Send + 'static {
    /// Deliver `record` to the collector at `endpoint` (base URL).
    fn deliver(&self, endpoint: &str, record: &CaptureRecord) -> OutboxResult<()>;
}

/// Full ingestion URL for a collector base URL.
pub fn capture_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), CAPTURE_PATH)
}

/// Blocking HTTP sender posting JSON to `<endpoint>/api/capture`.
///
/// Owns a `reqwest` blocking client, so it must be created and dropped
/// outside any async runtime; the transport worker thread does both.
pub struct CollectorSender {
    client: Client,
}

impl CollectorSender {
    /// Create a new sender.
    ///
    /// Redirects are not followed: a 3xx from the collector is a rejection.
    pub fn new(config: &SenderConfig) -> OutboxResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::none())
            .build()?;

        Ok(Self { client })
    }
}

impl Delivery for CollectorSender {
    fn deliver(&self, endpoint: &str, record: &CaptureRecord) -> OutboxResult<()> {
        let url = capture_url(endpoint);
        let body = serde_json::to_vec(record)?;

        debug!(url = %url, capture_id = %record.id, bytes = body.len(), "Sending capture");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OutboxError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
