//! HTTP surface of the consumer service.
//!
//! The router never touches the subscription loop directly. It only reads
//! [`ConsumerState`] and, for `/test-email`, uses the same [`EmailSender`]
//! as the acknowledgement handler.

use crate::config::KafkaEnvEcho;
use axum::{
    Json, Router,
    extract::{FromRef, State},
    routing::{get, post},
};
use complaints_core::{EmailSender, OutgoingEmail};
use complaints_runtime::ConsumerState;
use complaints_web::{AppError, WebResult, handlers};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Name reported by `GET /health`.
pub const SERVICE_NAME: &str = "complaints-consumer";

/// Reference used in test emails.
pub const TEST_REFERENCE: &str = "TEST123";

/// Shared state of the consumer's HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Consumer run/liveness flags.
    pub consumer: ConsumerState,
    /// Email capability used by `/test-email`.
    pub email: Arc<dyn EmailSender>,
    /// Raw broker configuration for `/debug/env`.
    pub kafka_env: KafkaEnvEcho,
}

impl FromRef<AppState> for ConsumerState {
    fn from_ref(state: &AppState) -> Self {
        state.consumer.clone()
    }
}

/// Build the consumer router.
///
/// # Routes
///
/// - `GET /` - banner
/// - `GET /health` - process liveness, always 200
/// - `GET /health/consumer`, `GET /ready` - 200 when connected, 503 otherwise
/// - `GET /debug/env` - broker configuration echo
/// - `POST /test-email` - send a test email
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| handlers::health_check(SERVICE_NAME)))
        .route("/health/consumer", get(handlers::consumer_health))
        .route("/ready", get(handlers::consumer_health))
        .route("/debug/env", get(debug_env))
        .route("/test-email", post(test_email))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct Banner {
    message: &'static str,
}

async fn root() -> Json<Banner> {
    Json(Banner {
        message: "Complaints Consumer Service is running",
    })
}

async fn debug_env(State(state): State<AppState>) -> Json<KafkaEnvEcho> {
    Json(state.kafka_env)
}

/// Body of `POST /test-email`.
#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    /// Recipient.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Response of a successful `POST /test-email`.
#[derive(Debug, Serialize)]
pub struct TestEmailResponse {
    /// Always `"sent"`.
    pub status: &'static str,
    /// Recipient.
    pub to: String,
    /// Reference embedded in the body.
    pub reference: &'static str,
}

async fn test_email(
    State(state): State<AppState>,
    Json(request): Json<TestEmailRequest>,
) -> WebResult<Json<TestEmailResponse>> {
    if request.to.trim().is_empty() {
        return Err(AppError::validation("to is required"));
    }

    let body = format!(
        "{}\n\nYour reference ticket number is {TEST_REFERENCE}.",
        request.body
    );
    let email = OutgoingEmail::new(request.to.clone(), request.subject, body);
    state.email.send(&email).await?;

    tracing::info!(to = %request.to, "Test email sent");
    Ok(Json(TestEmailResponse {
        status: "sent",
        to: request.to,
        reference: TEST_REFERENCE,
    }))
}
