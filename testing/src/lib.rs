//! # Complaints Testing
//!
//! Fast, deterministic stand-ins for every collaborator of the producer and
//! consumer services, so that the subscription loop, the acknowledgement
//! handler and the HTTP routers can be exercised without Postgres, Kafka or
//! an SMTP server.
//!
//! - [`InMemoryRecordStore`] - `HashMap`-backed [`RecordStore`](complaints_core::RecordStore)
//! - [`RecordingEmailSender`] - captures sent emails, optionally failing
//! - [`RecordingPublisher`] - captures published messages, optionally failing
//! - [`ScriptedConnector`] - broker fake driven by a script of sessions
//!
//! ## Example
//!
//! ```
//! use complaints_testing::{InMemoryRecordStore, sample_record};
//!
//! let store = InMemoryRecordStore::with_records([sample_record("789")]);
//! assert_eq!(store.len(), 1);
//! ```

pub mod broker;
pub mod email;
pub mod publisher;
pub mod store;

pub use broker::{ScriptedConnection, ScriptedConnector, SessionStep};
pub use email::RecordingEmailSender;
pub use publisher::RecordingPublisher;
pub use store::InMemoryRecordStore;

use chrono::{TimeZone, Utc};
use complaints_core::{RecordId, SubmittedRecord};

/// A fully populated record for `Jane Doe <jane@example.com>`.
///
/// The timestamp is fixed so that records compare equal across runs.
#[must_use]
pub fn sample_record(id: &str) -> SubmittedRecord {
    SubmittedRecord {
        id: RecordId::new(id),
        email_id: "jane.doe@customer.example".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@example.com".to_string(),
        subject: "Broken printer".to_string(),
        body: "The printer on floor 3 jams on every page.".to_string(),
        attachment: None,
        submitted_at: Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .unwrap_or_default(),
    }
}

/// Install a test-friendly `tracing` subscriber.
///
/// Safe to call from every test; only the first call takes effect.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}
