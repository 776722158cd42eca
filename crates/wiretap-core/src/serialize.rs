//! Turns an observed exchange into a [`CaptureRecord`].
//!
//! Everything here is infallible: a value that cannot be represented as
//! text degrades to a placeholder, so a capture can never break the call it
//! observed.

use crate::record::{CaptureRecord, ClientMeta, Headers, RequestData, ResponseData};
use crate::CaptureConfig;
use std::time::Duration;

/// Replacement value for redacted request headers.
pub const REDACTED: &str = "[REDACTED]";

/// Replacement for values that have no text representation.
pub const UNSERIALIZABLE: &str = "<unserializable>";

/// Timestamp format used on the wire.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A request or response payload as the interception point saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> Body<'a> {
    /// Length of the original payload in bytes.
    pub fn len(&self) -> usize {
        match self {
            Body::Text(text) => text.len(),
            Body::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a str> for Body<'a> {
    fn from(text: &'a str) -> Self {
        Body::Text(text)
    }
}

impl<'a> From<&'a String> for Body<'a> {
    fn from(text: &'a String) -> Self {
        Body::Text(text.as_str())
    }
}

impl<'a> From<&'a [u8]> for Body<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Body::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Body<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Body::Bytes(bytes.as_slice())
    }
}

/// Everything an interception point hands over for one exchange.
#[derive(Debug, Clone)]
pub struct Observation<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub request_headers: &'a [(String, String)],
    pub request_body: Option<Body<'a>>,
    pub status_code: u16,
    pub response_headers: &'a [(String, String)],
    pub response_body: Option<Body<'a>>,
    /// Caller-measured wall-clock time around the underlying call.
    pub duration: Duration,
    /// Tag of the client library, e.g. `"reqwest"`.
    pub library: &'a str,
}

/// Build a normalized, redacted record.
pub fn build(observation: &Observation<'_>, config: &CaptureConfig) -> CaptureRecord {
    let request_headers = redact_headers(&collect_headers(observation.request_headers), config);
    let response_headers = collect_headers(observation.response_headers);

    CaptureRecord {
        id: uuid::Uuid::new_v4().to_string(),
        timestamp: chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string(),
        duration_ms: duration_ms(observation.duration),
        request: RequestData {
            method: observation.method.to_uppercase(),
            url: observation.url.to_string(),
            headers: request_headers,
            body: body_to_text(observation.request_body, config.max_body_size),
            body_size: observation.request_body.map_or(0, |b| b.len()),
        },
        response: ResponseData {
            status_code: observation.status_code,
            headers: response_headers,
            body: body_to_text(observation.response_body, config.max_body_size),
            body_size: observation.response_body.map_or(0, |b| b.len()),
        },
        meta: ClientMeta::current(observation.library),
    }
}

/// Replace the value of every header on the deny-list with [`REDACTED`].
///
/// Matching is case-insensitive. Applying it twice yields the same map.
pub fn redact_headers(headers: &Headers, config: &CaptureConfig) -> Headers {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if config.is_redacted(name) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}

/// Text form of a body.
///
/// Bytes that are not UTF-8 become `"<binary: N bytes>"`. Text longer than
/// `max_len` is cut at the nearest char boundary.
pub fn body_to_text(body: Option<Body<'_>>, max_len: Option<usize>) -> Option<String> {
    let text = match body? {
        Body::Text(text) => text,
        Body::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => return Some(binary_placeholder(bytes.len())),
        },
    };

    let text = match max_len {
        Some(max) => truncate_at_boundary(text, max),
        None => text,
    };
    Some(text.to_string())
}

/// Placeholder for a binary body of `len` bytes.
pub fn binary_placeholder(len: usize) -> String {
    format!("<binary: {len} bytes>")
}

/// Round to the nearest millisecond, halves up.
pub fn duration_ms(duration: Duration) -> u64 {
    ((duration.as_nanos() + 500_000) / 1_000_000) as u64
}

/// Header pairs into a map; repeated names are joined with `", "`.
fn collect_headers(pairs: &[(String, String)]) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in pairs {
        headers
            .entry(name.clone())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.clone());
    }
    headers
}

fn truncate_at_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn observation<'a>(
        request_headers: &'a [(String, String)],
        response_headers: &'a [(String, String)],
    ) -> Observation<'a> {
        Observation {
            method: "post",
            url: "https://api.example.com/v1/items",
            request_headers,
            request_body: Some(Body::Text(r#"{"name":"widget"}"#)),
            status_code: 201,
            response_headers,
            response_body: Some(Body::Bytes(b"created")),
            duration: Duration::from_millis(150),
            library: "reqwest",
        }
    }

    #[test]
    fn test_build_normalizes_exchange() {
        let request = pairs(&[("Authorization", "Bearer secret"), ("Accept", "*/*")]);
        let response = pairs(&[("Content-Type", "text/plain")]);
        let config = CaptureConfig::default();

        let record = build(&observation(&request, &response), &config);

        assert_eq!(record.request.method, "POST");
        assert_eq!(record.request.url, "https://api.example.com/v1/items");
        assert_eq!(record.request.headers["Authorization"], REDACTED);
        assert_eq!(record.request.headers["Accept"], "*/*");
        assert_eq!(record.request.body.as_deref(), Some(r#"{"name":"widget"}"#));
        assert_eq!(record.request.body_size, 17);
        assert_eq!(record.response.status_code, 201);
        assert_eq!(record.response.headers["Content-Type"], "text/plain");
        assert_eq!(record.response.body.as_deref(), Some("created"));
        assert_eq!(record.response.body_size, 7);
        assert_eq!(record.duration_ms, 150);
        assert_eq!(record.meta.library, "reqwest");
        assert!(uuid::Uuid::parse_str(&record.id).is_ok());
        assert!(chrono::NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_build_generates_unique_ids() {
        let config = CaptureConfig::default();
        let obs = observation(&[], &[]);
        let a = build(&obs, &config);
        let b = build(&obs, &config);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_response_headers_never_redacted() {
        let request = pairs(&[]);
        let response = pairs(&[("Authorization", "echoed"), ("X-Api-Key", "k")]);
        let config = CaptureConfig::default();

        let record = build(&observation(&request, &response), &config);

        assert_eq!(record.response.headers["Authorization"], "echoed");
        assert_eq!(record.response.headers["X-Api-Key"], "k");
    }

    #[test]
    fn test_redaction_case_insensitive_and_idempotent() {
        let config = CaptureConfig {
            redact_headers: vec!["authorization".into(), "x-api-key".into(), "cookie".into()],
            ..Default::default()
        };
        let headers: Headers = pairs(&[
            ("AUTHORIZATION", "Bearer a"),
            ("x-Api-Key", "k"),
            ("Cookie", "session=1"),
            ("User-Agent", "agent/1.0"),
        ])
        .into_iter()
        .collect();

        let once = redact_headers(&headers, &config);
        let twice = redact_headers(&once, &config);

        for name in ["AUTHORIZATION", "x-Api-Key", "Cookie"] {
            assert_eq!(once[name], REDACTED, "{name} should be redacted");
        }
        assert_eq!(once["User-Agent"], "agent/1.0");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_deny_list_redacts_nothing() {
        let config = CaptureConfig {
            redact_headers: vec![],
            ..Default::default()
        };
        let headers: Headers = pairs(&[("Authorization", "Bearer a")]).into_iter().collect();
        assert_eq!(redact_headers(&headers, &config), headers);
    }

    #[test]
    fn test_repeated_request_headers_joined() {
        let request = pairs(&[("Accept", "text/html"), ("Accept", "application/json")]);
        let record = build(&observation(&request, &[]), &CaptureConfig::default());
        assert_eq!(record.request.headers["Accept"], "text/html, application/json");
    }

    #[test]
    fn test_body_absent() {
        assert_eq!(body_to_text(None, None), None);

        let mut obs = observation(&[], &[]);
        obs.request_body = None;
        obs.response_body = None;
        let record = build(&obs, &CaptureConfig::default());
        assert_eq!(record.request.body, None);
        assert_eq!(record.request.body_size, 0);
        assert_eq!(record.response.body, None);
        assert_eq!(record.response.body_size, 0);
    }

    #[test]
    fn test_body_text_passthrough() {
        assert_eq!(
            body_to_text(Some(Body::Text("héllo")), None).as_deref(),
            Some("héllo")
        );
        assert_eq!(
            body_to_text(Some(Body::Bytes("héllo".as_bytes())), None).as_deref(),
            Some("héllo")
        );
    }

    #[test]
    fn test_binary_body_placeholder() {
        let payloads: [&[u8]; 3] = [&[0xff], &[0x00, 0x9f, 0x92, 0x96], &[0xc3; 1024]];
        for bytes in payloads {
            let mut obs = observation(&[], &[]);
            obs.response_body = Some(Body::Bytes(bytes));
            let record = build(&obs, &CaptureConfig::default());

            assert_eq!(
                record.response.body.as_deref(),
                Some(format!("<binary: {} bytes>", bytes.len()).as_str())
            );
            assert_eq!(record.response.body_size, bytes.len());
        }
    }

    #[test]
    fn test_max_body_size_truncates_display_only() {
        let config = CaptureConfig {
            max_body_size: Some(4),
            ..Default::default()
        };
        let mut obs = observation(&[], &[]);
        obs.request_body = Some(Body::Text("abcdefgh"));
        // 'é' is two bytes, so a cut at 4 would land inside the second one.
        obs.response_body = Some(Body::Text("aééé"));

        let record = build(&obs, &config);

        assert_eq!(record.request.body.as_deref(), Some("abcd"));
        assert_eq!(record.request.body_size, 8);
        assert_eq!(record.response.body.as_deref(), Some("aé"));
        assert_eq!(record.response.body_size, 7);
    }

    #[test]
    fn test_max_body_size_keeps_binary_placeholder() {
        let placeholder = body_to_text(Some(Body::Bytes(&[0xff; 64])), Some(3));
        assert_eq!(placeholder.as_deref(), Some("<binary: 64 bytes>"));
    }

    #[test]
    fn test_duration_rounding() {
        assert_eq!(duration_ms(Duration::ZERO), 0);
        assert_eq!(duration_ms(Duration::from_micros(1_499)), 1);
        assert_eq!(duration_ms(Duration::from_micros(1_500)), 2);
        assert_eq!(duration_ms(Duration::from_secs_f64(0.2346)), 235);
        assert_eq!(duration_ms(Duration::from_secs(3)), 3_000);
    }

    #[test]
    fn test_body_from_impls() {
        let owned = String::from("text");
        let bytes = vec![1u8, 2, 3];
        assert_eq!(Body::from("text"), Body::Text("text"));
        assert_eq!(Body::from(&owned), Body::Text("text"));
        assert_eq!(Body::from(&bytes), Body::Bytes(&[1, 2, 3]));
        assert_eq!(Body::from(&bytes[..]).len(), 3);
        assert!(Body::Text("").is_empty());
    }
}
