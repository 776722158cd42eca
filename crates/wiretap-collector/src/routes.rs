//! HTTP routes of the collector.

use crate::models::{
    CaptureAck, CapturePayload, ListQuery, RequestDetail, RequestSummary, StoredCapture,
};
use crate::{CaptureStore, CollectorError, CollectorResult};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: CaptureStore,
}

/// Build the collector router over `store`.
pub fn router(store: CaptureStore) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/capture", post(capture))
        .route("/requests", get(list_requests).delete(clear_requests))
        .route("/requests/{id}", get(get_request))
}

async fn capture(
    State(state): State<AppState>,
    Json(payload): Json<CapturePayload>,
) -> CollectorResult<(StatusCode, Json<CaptureAck>)> {
    let stored = StoredCapture::from_payload(payload, Utc::now());
    debug!(
        id = %stored.id,
        method = %stored.method,
        host = %stored.host,
        status = stored.status_code,
        "Capture received"
    );

    state.store.insert(stored)?;
    Ok((StatusCode::CREATED, Json(CaptureAck::ok())))
}

async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<RequestSummary>> {
    let summaries = state
        .store
        .list(&query)
        .iter()
        .map(StoredCapture::summary)
        .collect();
    Json(summaries)
}

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> CollectorResult<Json<RequestDetail>> {
    state
        .store
        .get(&id)
        .map(|capture| Json(capture.detail()))
        .ok_or(CollectorError::NotFound)
}

async fn clear_requests(State(state): State<AppState>) -> StatusCode {
    let removed = state.store.clear();
    info!(removed, "Cleared captures");
    StatusCode::NO_CONTENT
}
