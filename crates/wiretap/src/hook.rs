//! Interception points.
//!
//! A client wrapper calls [`Wiretap::begin`] before sending, performs the
//! request, and hands what it saw to [`PendingCapture::finish`]. Excluded
//! hosts cost one filter lookup and nothing else.

use crate::Wiretap;
use reqwest::header::HeaderMap;
use std::time::{Duration, Instant};
use wiretap_core::{Body, Observation, UNSERIALIZABLE};

/// What the interception point observed once the call returned.
#[derive(Debug, Clone, Default)]
pub struct Exchange<'a> {
    pub request_headers: &'a [(String, String)],
    pub request_body: Option<Body<'a>>,
    pub status_code: u16,
    pub response_headers: &'a [(String, String)],
    pub response_body: Option<Body<'a>>,
    /// Tag of the HTTP client library, e.g. `"reqwest"`.
    pub library: &'a str,
}

/// A call that passed the host filter and is being timed.
#[must_use = "a pending capture records nothing until finished"]
pub struct PendingCapture {
    wiretap: Wiretap,
    method: String,
    url: String,
    started: Instant,
}

impl Wiretap {
    /// Start timing a call to `url`, or `None` if its host is excluded.
    pub fn begin(&self, method: &str, url: &str) -> Option<PendingCapture> {
        if !self.should_capture_url(url) {
            return None;
        }

        Some(PendingCapture {
            wiretap: self.clone(),
            method: method.to_string(),
            url: url.to_string(),
            started: Instant::now(),
        })
    }
}

impl PendingCapture {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Time since [`Wiretap::begin`].
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop the clock and queue the capture.
    pub fn finish(self, exchange: &Exchange<'_>) {
        let duration = self.started.elapsed();
        self.wiretap.capture(&Observation {
            method: &self.method,
            url: &self.url,
            request_headers: exchange.request_headers,
            request_body: exchange.request_body,
            status_code: exchange.status_code,
            response_headers: exchange.response_headers,
            response_body: exchange.response_body,
            duration,
            library: exchange.library,
        });
    }
}

/// Flatten a header map into text pairs, one per value.
///
/// Values that are not visible ASCII become [`UNSERIALIZABLE`].
pub fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = value
                .to_str()
                .map(str::to_string)
                .unwrap_or_else(|_| UNSERIALIZABLE.to_string());
            (name.as_str().to_string(), value)
        })
        .collect()
}
