//! End-to-end: scripted broker -> subscription loop -> acknowledgement
//! handler -> recording email sender.

#![allow(clippy::expect_used)]

use complaint_consumer::AcknowledgementHandler;
use complaints_runtime::{ConsumerState, LoopSettings, SubscriptionLoop};
use complaints_testing::{
    InMemoryRecordStore, RecordingEmailSender, ScriptedConnector, SessionStep, init_test_tracing,
    sample_record,
};
use std::sync::Arc;
use std::time::Duration;

struct Pipeline {
    state: ConsumerState,
    email: RecordingEmailSender,
    handle: tokio::task::JoinHandle<()>,
}

fn start(store: InMemoryRecordStore, payloads: &[&[u8]]) -> Pipeline {
    start_with(store, RecordingEmailSender::new(), payloads)
}

fn start_with(
    store: InMemoryRecordStore,
    email: RecordingEmailSender,
    payloads: &[&[u8]],
) -> Pipeline {
    init_test_tracing();
    let state = ConsumerState::new();
    let handler = Arc::new(AcknowledgementHandler::new(
        Arc::new(store),
        Arc::new(email.clone()),
    ));
    let connector =
        ScriptedConnector::new().session([SessionStep::payloads(payloads.iter().copied())]);

    state.set_running(true);
    let subscription = SubscriptionLoop::new(connector, handler, state.clone()).with_settings(
        LoopSettings {
            broker_wait: Duration::from_secs(10),
            ..LoopSettings::default()
        },
    );
    let handle = tokio::spawn(subscription.run());

    Pipeline {
        state,
        email,
        handle,
    }
}

impl Pipeline {
    async fn finish(self) -> RecordingEmailSender {
        tokio::time::sleep(Duration::from_secs(1)).await;
        self.state.set_running(false);
        tokio::time::timeout(Duration::from_secs(6), self.handle)
            .await
            .expect("consumer should stop")
            .expect("consumer task should not panic");
        self.email
    }
}

#[tokio::test(start_paused = true)]
async fn published_reference_triggers_acknowledgement() {
    let store = InMemoryRecordStore::with_records([sample_record("789")]);
    let pipeline = start(
        store,
        &[br#"{"id":"789","email_id":"jane@example.com","subject":"Complaint","body":"..."}"#],
    );

    let email = pipeline.finish().await;

    let sent = email.sent_to("jane@example.com");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("789"));
    assert!(
        sent[0]
            .body
            .contains("The printer on floor 3 jams on every page.")
    );
}

#[tokio::test(start_paused = true)]
async fn unknown_reference_sends_nothing() {
    let pipeline = start(InMemoryRecordStore::new(), &[br#"{"id":"nonexistent-id"}"#]);
    let state = pipeline.state.clone();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(state.is_live(), "consumer keeps running after a soft miss");

    let email = pipeline.finish().await;
    assert_eq!(email.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn bad_records_do_not_block_later_acknowledgements() {
    let store = InMemoryRecordStore::with_records([sample_record("a-1"), sample_record("a-2")]);
    let pipeline = start(
        store,
        &[
            br#"{"id":"a-1"}"#,
            b"",
            b"{not json",
            b"null",
            br#"{"subject":"no id"}"#,
            br#"{"id":"a-2"}"#,
        ],
    );

    let email = pipeline.finish().await;

    let subjects: Vec<String> = email.sent().into_iter().map(|e| e.subject).collect();
    assert_eq!(subjects.len(), 2);
    assert!(subjects[0].ends_with("a-1"));
    assert!(subjects[1].ends_with("a-2"));
}

#[tokio::test(start_paused = true)]
async fn failed_delivery_does_not_block_later_acknowledgements() {
    let mut bounced = sample_record("b-1");
    bounced.email = "bounce@example.com".to_string();
    let store = InMemoryRecordStore::with_records([bounced, sample_record("b-2")]);
    let email = RecordingEmailSender::new();
    email.reject("bounce@example.com");

    let pipeline = start_with(store, email, &[br#"{"id":"b-1"}"#, br#"{"id":"b-2"}"#]);
    let state = pipeline.state.clone();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(state.is_live(), "consumer keeps running after a failed delivery");

    let email = pipeline.finish().await;
    let sent = email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "jane@example.com");
    assert!(sent[0].subject.ends_with("b-2"));
}
