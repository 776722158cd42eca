//! Capture outgoing HTTP exchanges and ship them to a wiretap collector.
//!
//! ```no_run
//! let wiretap = wiretap::init(wiretap::CaptureConfig::from_env())?;
//! if let Some(wiretap) = &wiretap {
//!     if let Some(pending) = wiretap.begin("GET", "https://api.example.com/users") {
//!         // ... perform the request ...
//!         pending.finish(&wiretap::Exchange {
//!             status_code: 200,
//!             library: "reqwest",
//!             ..Default::default()
//!         });
//!     }
//!     wiretap.shutdown(wiretap::DEFAULT_FLUSH_TIMEOUT);
//! }
//! # Ok::<(), wiretap::WiretapError>(())
//! ```
//!
//! Capturing happens off the caller's path: records are queued and a single
//! background thread posts them to the collector. A full queue drops new
//! records and an unreachable collector loses them; neither is reported to
//! the instrumented code.

mod error;
pub mod hook;

pub use error::{WiretapError, WiretapResult};
pub use hook::{header_pairs, Exchange, PendingCapture};
pub use wiretap_core::{
    Body, CaptureConfig, CaptureRecord, Observation, DEFAULT_REDACT_HEADERS, DEFAULT_SERVER_URL,
    REDACTED, UNSERIALIZABLE,
};
pub use wiretap_outbox::{Delivery, OutboxConfig, QueueStatus, SenderConfig};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use wiretap_outbox::{OutboxManager, OutboxResult};

/// Timeout used by callers that have no better figure for flush/shutdown.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Start capturing with `config`.
///
/// Returns `Ok(None)` when `config.enabled` is false; nothing is started in
/// that case. Otherwise the configuration is normalized, the transport
/// worker is launched against `server_url`, and a handle is returned for
/// the interception points to share.
pub fn init(config: CaptureConfig) -> WiretapResult<Option<Wiretap>> {
    init_with(config, OutboxConfig::default())
}

/// [`init`] with explicit queue and sender settings.
pub fn init_with(config: CaptureConfig, outbox: OutboxConfig) -> WiretapResult<Option<Wiretap>> {
    if !config.enabled {
        info!("Wiretap disabled");
        return Ok(None);
    }

    let config = config.normalized();
    config.validate()?;

    let manager = OutboxManager::new(outbox);
    manager.start(&config.server_url)?;

    Ok(Some(Wiretap::from_parts(config, manager)))
}

/// Handle to a running capture pipeline. Cheap to clone.
#[derive(Clone)]
pub struct Wiretap {
    inner: Arc<Inner>,
}

struct Inner {
    config: CaptureConfig,
    outbox: OutboxManager,
}

impl Wiretap {
    /// Start a pipeline whose worker delivers through `make_delivery`
    /// instead of HTTP. Ignores `config.enabled`.
    pub fn start_with<D, F>(
        config: CaptureConfig,
        outbox: OutboxConfig,
        make_delivery: F,
    ) -> WiretapResult<Self>
    where
        D: Delivery,
        F: FnOnce() -> OutboxResult<D> + Send + 'static,
    {
        let config = config.normalized();
        config.validate()?;

        let manager = OutboxManager::new(outbox);
        manager.start_with(&config.server_url, make_delivery)?;

        Ok(Self::from_parts(config, manager))
    }

    fn from_parts(config: CaptureConfig, outbox: OutboxManager) -> Self {
        info!(
            server_url = %config.server_url,
            capture_all = config.capture_all,
            ignore_hosts = ?config.ignore_hosts,
            "Wiretap initialized"
        );
        Self {
            inner: Arc::new(Inner { config, outbox }),
        }
    }

    /// The normalized configuration in effect.
    pub fn config(&self) -> &CaptureConfig {
        &self.inner.config
    }

    pub fn should_capture(&self, host: &str) -> bool {
        self.inner.config.should_capture(host)
    }

    pub fn should_capture_url(&self, url: &str) -> bool {
        self.inner.config.should_capture_url(url)
    }

    /// Serialize and queue one exchange. Never fails and never panics.
    ///
    /// The host filter is not consulted here; use [`begin`](Self::begin)
    /// or [`should_capture_url`](Self::should_capture_url) first.
    pub fn capture(&self, observation: &Observation<'_>) {
        let built = panic::catch_unwind(AssertUnwindSafe(|| {
            wiretap_core::build(observation, &self.inner.config)
        }));

        match built {
            Ok(record) => {
                self.inner.outbox.enqueue(record);
            }
            Err(_) => debug!(url = %observation.url, "Failed to capture request"),
        }
    }

    /// Block until queued captures have been attempted, up to `timeout`.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.inner.outbox.flush(timeout)
    }

    /// Drain before exit. The worker thread itself is never stopped.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.inner.outbox.shutdown(timeout)
    }

    pub fn status(&self) -> QueueStatus {
        self.inner.outbox.status()
    }
}
