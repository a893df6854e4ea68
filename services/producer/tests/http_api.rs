//! HTTP endpoints of the producer service, backed by in-memory fakes.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use base64::{Engine, engine::general_purpose::STANDARD};
use axum_test::TestServer;
use complaint_producer::{AppState, MAX_ATTACHMENT_BYTES, QUEUE_WARNING, build_router};
use complaints_testing::{InMemoryRecordStore, RecordingPublisher};
use serde_json::{Value, json};
use std::sync::Arc;

struct Harness {
    server: TestServer,
    store: InMemoryRecordStore,
    publisher: RecordingPublisher,
}

fn harness() -> Harness {
    let store = InMemoryRecordStore::new();
    let publisher = RecordingPublisher::new();
    let app = build_router(AppState {
        store: Arc::new(store.clone()),
        publisher: Arc::new(publisher.clone()),
    });
    Harness {
        server: TestServer::new(app).unwrap(),
        store,
        publisher,
    }
}

fn submission() -> Value {
    json!({
        "email_id": "74f3a8a9-bce7-4d8b-8f1b-1c4d1f2da111",
        "first_name": "Asha",
        "last_name": "K",
        "email": "asha@example.com",
        "subject": "Login issue",
        "body": "I cannot log in to the portal after password reset."
    })
}

#[tokio::test]
async fn health_is_ok() {
    let h = harness();
    let body: Value = h.server.get("/health").await.json();
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn submission_is_saved_and_queued() {
    let h = harness();

    let response = h.server.post("/submit").json(&submission()).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "saved");
    assert_eq!(body["warning"], Value::Null);

    let id = body["id"].as_str().unwrap();
    let stored = h.store.get(id).unwrap();
    assert_eq!(stored.email, "asha@example.com");
    assert_eq!(stored.subject, "Login issue");

    let published = h.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id.as_deref(), Some(id));
    assert_eq!(published[0].email.as_deref(), Some("asha@example.com"));
    assert!(published[0].body.is_none());
}

#[tokio::test]
async fn publish_failure_still_saves() {
    let h = harness();
    h.publisher.set_failing(true);

    let response = h.server.post("/submit").json(&submission()).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "saved");
    assert_eq!(body["warning"], QUEUE_WARNING);
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn database_failure_is_500_and_nothing_is_queued() {
    let h = harness();
    h.store.set_unavailable(true);

    let response = h.server.post("/submit").json(&submission()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["message"], "Database error. Please try again later.");
    assert!(h.publisher.published().is_empty());
}

#[tokio::test]
async fn invalid_submission_is_422() {
    let h = harness();
    let mut payload = submission();
    payload["first_name"] = json!("");

    let response = h.server.post("/submit").json(&payload).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn missing_field_is_422() {
    let h = harness();
    let mut payload = submission();
    payload.as_object_mut().unwrap().remove("body");

    let response = h.server.post("/submit").json(&payload).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(h.publisher.published().is_empty());
}

#[tokio::test]
async fn attachment_is_stored() {
    let h = harness();
    let mut payload = submission();
    payload["attachment"] = json!({"name": "hello.txt", "content_base64": "aGVsbG8="});

    let response = h.server.post("/submit").json(&payload).await;

    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();
    let attachment = h.store.get(&id).unwrap().attachment.unwrap();
    assert_eq!(attachment.name, "hello.txt");
    assert_eq!(attachment.data, b"hello");
}

#[tokio::test]
async fn multi_megabyte_attachment_is_accepted() {
    let h = harness();
    let mut payload = submission();
    payload["attachment"] = json!({
        "name": "scan.pdf",
        "content_base64": STANDARD.encode(vec![7_u8; 3 * 1024 * 1024]),
    });

    let response = h.server.post("/submit").json(&payload).await;

    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();
    let attachment = h.store.get(&id).unwrap().attachment.unwrap();
    assert_eq!(attachment.data.len(), 3 * 1024 * 1024);
}

#[tokio::test]
async fn attachment_just_over_limit_is_422() {
    let h = harness();
    let mut payload = submission();
    payload["attachment"] = json!({
        "name": "huge.bin",
        "content_base64": STANDARD.encode(vec![0_u8; MAX_ATTACHMENT_BYTES + 1]),
    });

    let response = h.server.post("/submit").json(&payload).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
    assert!(h.store.is_empty());
    assert!(h.publisher.published().is_empty());
}
