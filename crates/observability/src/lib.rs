//! # Observability
//!
//! Tracing subscriber setup for the wiretap binaries.
//!
//! Library crates in the workspace only emit events through the `tracing`
//! macros. Binaries call [`init_with_config`] once at startup to decide
//! where those events go:
//!
//! - [`LogFormat::Compact`]: human readable lines on stderr.
//! - [`LogFormat::Json`]: one JSON object per line, written to stderr or
//!   appended to `log_path` when one is configured.
//!
//! `RUST_LOG` always wins over `default_level`.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "collector".into(),
//!         default_level: "debug".into(),
//!         ..Default::default()
//!     })
//!     .expect("logging");
//!
//!     tracing::info!("ready");
//! }
//! ```

mod file;
mod json_layer;

use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use file::{LogFileWriter, LogFileWriterFactory};
pub use json_layer::JsonLayer;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact single-line text, intended for terminals.
    #[default]
    Compact,
    /// Structured JSONL.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" | "jsonl" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "collector").
    /// Included in every JSON log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Output format.
    pub format: LogFormat,

    /// Append JSON lines to this file instead of stderr.
    /// Ignored for [`LogFormat::Compact`].
    pub log_path: Option<PathBuf>,

    /// Also emit compact lines to stderr when writing JSON to a file.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            format: LogFormat::Compact,
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the observability layer with custom configuration.
///
/// Installing a second global subscriber is a no-op, so tests and
/// embedding applications that already configured `tracing` are left alone.
///
/// # Errors
///
/// Returns an error if `log_path` is set and the file cannot be opened.
pub fn init_with_config(config: LogConfig) -> io::Result<()> {
    let filter = env_filter(&config.default_level);

    match (config.format, config.log_path.as_ref()) {
        (LogFormat::Compact, _) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(io::stderr)
                .compact()
                .try_init();
        }
        (LogFormat::Json, None) => {
            let json = JsonLayer::new(config.service_name.clone(), io::stderr);
            let _ = tracing_subscriber::registry()
                .with(json.with_filter(filter))
                .try_init();
        }
        (LogFormat::Json, Some(path)) => {
            let writer = LogFileWriter::new(path)?;
            let json = JsonLayer::new(
                config.service_name.clone(),
                LogFileWriterFactory::new(writer),
            );

            let stderr_layer = config.also_stderr.then(|| {
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .compact()
                    .with_writer(io::stderr)
                    .with_filter(env_filter(&config.default_level))
            });

            let _ = tracing_subscriber::registry()
                .with(json.with_filter(filter))
                .with(stderr_layer)
                .try_init();

            tracing::info!(log_path = %path.display(), "observability initialized");
        }
    }

    Ok(())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
