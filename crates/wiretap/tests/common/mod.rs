//! Harness: a real collector plus a small upstream API, each on its own
//! thread and runtime so the blocking client under test can call them.

use axum::http::{header, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use wiretap_collector::{models::StoredCapture, CaptureStore};

pub struct TestCollector {
    /// Base URL using `localhost`, so it never collides with the upstream.
    pub base_url: String,
    pub store: CaptureStore,
}

impl TestCollector {
    pub fn start() -> Self {
        let store = CaptureStore::new(1_000);
        let addr = serve_in_background(wiretap_collector::router(store.clone()));
        Self {
            base_url: format!("http://localhost:{}", addr.port()),
            store,
        }
    }

    pub fn received(&self) -> Vec<StoredCapture> {
        self.store.snapshot()
    }
}

/// Upstream API on `127.0.0.1`. Returns its base URL.
pub fn start_upstream() -> String {
    let app = Router::new()
        .route(
            "/hello",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "application/json"), (header::SERVER, "upstream")],
                    r#"{"hello":"world"}"#,
                )
            }),
        )
        .route(
            "/echo",
            post(|body: String| async move { (StatusCode::CREATED, body) }),
        );
    format!("http://{}", serve_in_background(app))
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
