//! Router and shared state of the producer service.

use crate::submit::{MAX_BODY_BYTES, submit};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use complaints_core::{ComplaintPublisher, RecordStore};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state of the producer's HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Where submissions are persisted.
    pub store: Arc<dyn RecordStore>,
    /// Where references are queued.
    pub publisher: Arc<dyn ComplaintPublisher>,
}

#[derive(Serialize)]
struct Health {
    ok: bool,
}

/// Build the producer router: `GET /health` and `POST /submit`.
///
/// Request bodies are capped at [`MAX_BODY_BYTES`] so a maximal attachment
/// reaches validation instead of axum's default limit.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { ok: true }) }))
        .route("/submit", post(submit))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
