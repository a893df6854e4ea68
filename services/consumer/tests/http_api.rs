//! HTTP endpoints of the consumer service.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use axum_test::TestServer;
use complaint_consumer::{AppState, KafkaEnvEcho, build_router};
use complaints_runtime::ConsumerState;
use complaints_testing::RecordingEmailSender;
use serde_json::{Value, json};
use std::sync::Arc;

fn server(state: &ConsumerState, email: &RecordingEmailSender) -> TestServer {
    let app = build_router(AppState {
        consumer: state.clone(),
        email: Arc::new(email.clone()),
        kafka_env: KafkaEnvEcho {
            broker: "redpanda:9092".to_string(),
            topic: "complaints.v1".to_string(),
            group: "not set".to_string(),
            offset: "earliest".to_string(),
        },
    });
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn root_banner() {
    let server = server(&ConsumerState::new(), &RecordingEmailSender::new());

    let body: Value = server.get("/").await.json();

    assert_eq!(body["message"], "Complaints Consumer Service is running");
}

#[tokio::test]
async fn health_ignores_consumer_state() {
    let server = server(&ConsumerState::new(), &RecordingEmailSender::new());

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "complaints-consumer");
}

#[tokio::test]
async fn readiness_tracks_liveness_on_both_routes() {
    let state = ConsumerState::new();
    state.set_running(true);
    let server = server(&state, &RecordingEmailSender::new());

    for path in ["/health/consumer", "/ready"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.json::<Value>()["status"], "unhealthy");
    }

    state.set_live(true);
    for path in ["/health/consumer", "/ready"] {
        let response = server.get(path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["live"], true);
        assert_eq!(body["running"], true);
    }

    state.set_live(false);
    server
        .get("/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn debug_env_echoes_raw_values() {
    let server = server(&ConsumerState::new(), &RecordingEmailSender::new());

    let body: Value = server.get("/debug/env").await.json();

    assert_eq!(
        body,
        json!({
            "KAFKA_BROKER": "redpanda:9092",
            "KAFKA_TOPIC": "complaints.v1",
            "KAFKA_GROUP": "not set",
            "KAFKA_OFFSET": "earliest",
        })
    );
}

#[tokio::test]
async fn test_email_is_sent_with_reference() {
    let email = RecordingEmailSender::new();
    let server = server(&ConsumerState::new(), &email);

    let response = server
        .post("/test-email")
        .json(&json!({"to": "ops@example.com", "subject": "Ping", "body": "Hello"}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["reference"], "TEST123");
    let sent = email.sent_to("ops@example.com");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Ping");
    assert!(sent[0].body.contains("TEST123"));
}

#[tokio::test]
async fn test_email_failure_is_a_500_with_the_error() {
    let email = RecordingEmailSender::failing("connection refused");
    let server = server(&ConsumerState::new(), &email);

    let response = server
        .post("/test-email")
        .json(&json!({"to": "ops@example.com", "subject": "Ping", "body": "Hello"}))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("connection refused"));
}
