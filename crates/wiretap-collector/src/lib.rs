//! Wiretap collector: receives captured exchanges and serves them back.
//!
//! Captures live in a bounded in-memory [`CaptureStore`]; nothing is
//! persisted across restarts.

mod error;
pub mod models;
mod routes;
mod store;

pub use error::{CollectorError, CollectorResult};
pub use routes::{router, AppState};
pub use store::{CaptureStore, DEFAULT_MAX_ENTRIES};

use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tracing::info;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port, matching the client's default server URL.
pub const DEFAULT_PORT: u16 = 5110;

/// Collector server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    pub host: String,
    pub port: u16,
    pub max_entries: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CollectorConfig {
    /// Socket address to bind.
    pub fn bind_addr(&self) -> CollectorResult<SocketAddr> {
        let ip = self.host.parse::<IpAddr>().map_err(|e| {
            CollectorError::Config(format!("Invalid bind address '{}': {e}", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Serve the collector API on an already bound listener until the
/// connection loop ends.
pub async fn serve(listener: TcpListener, store: CaptureStore) -> CollectorResult<()> {
    axum::serve(listener, router(store)).await?;
    Ok(())
}

/// Bind according to `config` and serve until Ctrl-C.
pub async fn run(config: CollectorConfig) -> CollectorResult<()> {
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    let store = CaptureStore::new(config.max_entries);

    info!(
        addr = %listener.local_addr()?,
        max_entries = store.max_entries(),
        "Collector listening"
    );

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Collector stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
