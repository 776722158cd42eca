//! Shared harness for delivery tests.
//!
//! The outbox is synchronous, so collectors run on their own thread with a
//! private tokio runtime and the tests themselves stay plain `#[test]`s.

use axum::http::{header, StatusCode};
use axum::routing::post;
use axum::Router;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use wiretap_collector::{models::StoredCapture, CaptureStore};
use wiretap_core::{build, CaptureConfig, CaptureRecord, Observation};

pub struct TestCollector {
    pub base_url: String,
    pub store: CaptureStore,
}

impl TestCollector {
    /// Real collector on `127.0.0.1:0`.
    pub fn start() -> Self {
        let store = CaptureStore::new(10_000);
        let addr = serve_in_background(wiretap_collector::router(store.clone()));
        Self {
            base_url: format!("http://{addr}"),
            store,
        }
    }

    /// Captures received so far, in arrival order.
    pub fn received(&self) -> Vec<StoredCapture> {
        self.store.snapshot()
    }
}

/// Collector that answers every request with HTTP 500.
pub fn start_failing_collector() -> String {
    let app = Router::new().fallback(|| async { StatusCode::INTERNAL_SERVER_ERROR });
    format!("http://{}", serve_in_background(app))
}

/// Collector whose ingestion path answers `307` to `/elsewhere`, which
/// would accept the capture. Returns the base URL and the hit counter of
/// the redirect target.
pub fn start_redirecting_collector() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new()
        .route(
            "/api/capture",
            post(|| async { (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, "/elsewhere")]) }),
        )
        .route(
            "/elsewhere",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    StatusCode::CREATED
                }
            }),
        );
    (format!("http://{}", serve_in_background(app)), hits)
}

/// Base URL of a port with nothing listening on it.
pub fn refused_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// A listener that accepts connections but never answers. Keep the
/// returned listener alive for as long as the endpoint should hang.
pub fn hanging_endpoint() -> (std::net::TcpListener, String) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("http://{addr}"))
}

fn serve_in_background(app: Router) -> SocketAddr {
    let (addr_tx, addr_rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            addr_tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    addr_rx.recv_timeout(Duration::from_secs(5)).unwrap()
}

/// A record for `GET https://api.example.com/items/{n}`.
pub fn record(n: usize) -> CaptureRecord {
    let url = format!("https://api.example.com/items/{n}");
    build(
        &Observation {
            method: "GET",
            url: &url,
            request_headers: &[],
            request_body: None,
            status_code: 200,
            response_headers: &[],
            response_body: None,
            duration: Duration::from_millis(5),
            library: "test",
        },
        &CaptureConfig::default(),
    )
}
