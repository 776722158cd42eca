//! Shared harness: a collector on an ephemeral port inside the test runtime.

use tokio::net::TcpListener;
use wiretap_collector::CaptureStore;

pub struct TestServer {
    pub base_url: String,
    pub store: CaptureStore,
}

/// Bind `127.0.0.1:0` and serve the collector in a background task.
pub async fn spawn_collector(max_entries: usize) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let store = CaptureStore::new(max_entries);

    let served = store.clone();
    tokio::spawn(async move {
        wiretap_collector::serve(listener, served).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        store,
    }
}

pub fn observation<'a>(
    method: &'a str,
    url: &'a str,
    headers: &'a [(String, String)],
) -> wiretap_core::Observation<'a> {
    wiretap_core::Observation {
        method,
        url,
        request_headers: headers,
        request_body: Some(wiretap_core::Body::Text("{\"name\":\"wiretap\"}")),
        status_code: 201,
        response_headers: &[],
        response_body: Some(wiretap_core::Body::Bytes(&[0xff, 0xfe, 0x00])),
        duration: std::time::Duration::from_millis(42),
        library: "reqwest",
    }
}
