//! Capture configuration and host filtering.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default collector base URL.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5110";

/// Request headers redacted when no explicit list is configured.
pub const DEFAULT_REDACT_HEADERS: [&str; 2] = ["authorization", "x-api-key"];

/// Process-wide capture configuration.
///
/// Built once at startup, then shared read-only with every interception
/// point. Call [`CaptureConfig::normalized`] before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Collector base URL, without trailing slash.
    pub server_url: String,
    /// Capture every host not explicitly ignored.
    pub capture_all: bool,
    /// Hosts to capture when `capture_all` is off.
    pub capture_hosts: Vec<String>,
    /// Hosts never captured. The collector's own host is appended on
    /// normalization.
    pub ignore_hosts: Vec<String>,
    /// Request header names whose values are replaced, lower-cased.
    pub redact_headers: Vec<String>,
    /// Master switch.
    pub enabled: bool,
    /// Cap, in bytes, on the text body kept in a record. `body_size` still
    /// reports the full length.
    pub max_body_size: Option<usize>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            capture_all: true,
            capture_hosts: Vec::new(),
            ignore_hosts: Vec::new(),
            redact_headers: DEFAULT_REDACT_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            enabled: true,
            max_body_size: None,
        }
    }
}

impl CaptureConfig {
    /// Defaults overridden from `WIRETAP_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CaptureConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from a key lookup, normally the process environment.
    ///
    /// Lists are comma separated; booleans accept `1/0`, `true/false`,
    /// `yes/no`, `on/off`. Unparseable values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WIRETAP_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(value) = lookup("WIRETAP_ENABLED") {
            apply_bool("WIRETAP_ENABLED", &value, &mut self.enabled);
        }
        if let Some(value) = lookup("WIRETAP_CAPTURE_ALL") {
            apply_bool("WIRETAP_CAPTURE_ALL", &value, &mut self.capture_all);
        }
        if let Some(value) = lookup("WIRETAP_CAPTURE_HOSTS") {
            self.capture_hosts = split_list(&value);
        }
        if let Some(value) = lookup("WIRETAP_IGNORE_HOSTS") {
            self.ignore_hosts = split_list(&value);
        }
        if let Some(value) = lookup("WIRETAP_REDACT_HEADERS") {
            self.redact_headers = split_list(&value);
        }
    }

    /// Canonical form: trailing slash stripped from the server URL, redact
    /// list lower-cased, and the collector host added to `ignore_hosts` so
    /// delivery traffic is never captured.
    pub fn normalized(mut self) -> Self {
        let trimmed = self.server_url.trim_end_matches('/').len();
        self.server_url.truncate(trimmed);

        self.redact_headers = self
            .redact_headers
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        match self.server_host() {
            Ok(Some(host)) => {
                if !self.ignore_hosts.contains(&host) {
                    self.ignore_hosts.push(host);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    server_url = %self.server_url,
                    error = %e,
                    "Collector URL does not parse"
                );
            }
        }

        self
    }

    /// Reject configurations that can never deliver.
    pub fn validate(&self) -> CoreResult<()> {
        let url = Url::parse(&self.server_url)?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(CoreError::Config(format!(
                "collector URL must be http or https, got {other}"
            ))),
        }
    }

    /// Host part of the collector URL.
    pub fn server_host(&self) -> CoreResult<Option<String>> {
        let url = Url::parse(&self.server_url)?;
        Ok(url.host_str().map(|h| h.to_string()))
    }

    /// Whether calls to `host` should be captured.
    ///
    /// Ignored hosts always lose; otherwise `capture_all` admits everything
    /// and the allow-list is consulted only when it is off.
    pub fn should_capture(&self, host: &str) -> bool {
        if self.ignore_hosts.iter().any(|h| h == host) {
            return false;
        }
        if self.capture_all {
            return true;
        }
        self.capture_hosts.iter().any(|h| h == host)
    }

    /// [`should_capture`](Self::should_capture) on the host of a full URL.
    /// URLs without a host are captured under the empty host name.
    pub fn should_capture_url(&self, url: &str) -> bool {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_default();
        self.should_capture(&host)
    }

    /// Whether `name` is on the redaction deny-list.
    pub fn is_redacted(&self, name: &str) -> bool {
        self.redact_headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn apply_bool(key: &str, value: &str, target: &mut bool) {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => *target = true,
        "0" | "false" | "no" | "off" => *target = false,
        _ => tracing::warn!(key, value, "Ignoring unparseable boolean override"),
    }
}
