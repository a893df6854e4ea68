//! Health and readiness endpoints.
//!
//! `/health` is pure process liveness and never looks at dependencies.
//! Consumer readiness is read from [`ConsumerState`]: the service is only
//! ready while a broker connection is established.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use complaints_runtime::ConsumerState;
use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `true` while the process serves requests.
    pub ok: bool,
    /// Always `"ok"`.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Time of the check.
    pub timestamp: DateTime<Utc>,
}

/// Process liveness.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8001/health
/// # {"ok":true,"status":"ok","service":"complaints-consumer",...}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check(service: &'static str) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        status: "ok",
        service,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

/// Body of the consumer readiness endpoints.
#[derive(Debug, Serialize)]
pub struct ConsumerHealthResponse {
    /// `"healthy"` when live, `"unhealthy"` otherwise.
    pub status: &'static str,
    /// Whether a broker connection is established.
    pub live: bool,
    /// Whether the consumer has been asked to keep running.
    pub running: bool,
    /// Time of the check.
    pub timestamp: DateTime<Utc>,
}

/// Consumer readiness.
///
/// # Status Codes
///
/// - 200 OK: connected to the broker
/// - 503 Service Unavailable: starting up, reconnecting or stopped
#[allow(clippy::unused_async)]
pub async fn consumer_health(
    State(state): State<ConsumerState>,
) -> (StatusCode, Json<ConsumerHealthResponse>) {
    let status = state.status();
    let code = if status.live {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(ConsumerHealthResponse {
            status: if status.live { "healthy" } else { "unhealthy" },
            live: status.live,
            running: status.running,
            timestamp: Utc::now(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use serde_json::Value;

    fn app(state: ConsumerState) -> Router {
        Router::new()
            .route("/health", get(|| health_check("test-service")))
            .route("/ready", get(consumer_health))
            .with_state(state)
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let server = TestServer::new(app(ConsumerState::new())).unwrap();

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["ok"], true);
        assert_eq!(body["service"], "test-service");
    }

    #[tokio::test]
    async fn not_ready_until_live() {
        let state = ConsumerState::new();
        state.set_running(true);
        let server = TestServer::new(app(state.clone())).unwrap();

        let response = server.get("/ready").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = response.json();
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["running"], true);

        state.set_live(true);
        let response = server.get("/ready").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["live"], true);
    }
}
