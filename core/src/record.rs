//! Submitted complaint records and the persistence seam.
//!
//! A [`SubmittedRecord`] is created once by the producer and never mutated.
//! The consumer only ever holds a transient copy read through
//! [`RecordStore::get_by_id`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Correlation id of a submitted record.
///
/// Stored as text so that the wire payload, the store and log fields all
/// agree on one representation. Stores decide what a well-formed id is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random (UUID v4) identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A file uploaded alongside a complaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name.
    pub name: String,
    /// Raw file contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Size of the attachment in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A complaint as persisted by the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRecord {
    /// Correlation id, also used as the customer-facing ticket reference.
    pub id: RecordId,
    /// Submitter-supplied identifier (kept verbatim).
    pub email_id: String,
    /// Submitter first name.
    pub first_name: String,
    /// Submitter last name.
    pub last_name: String,
    /// Contact address the acknowledgement is sent to.
    pub email: String,
    /// Complaint subject.
    pub subject: String,
    /// Complaint body.
    pub body: String,
    /// Optional uploaded file.
    pub attachment: Option<Attachment>,
    /// Creation timestamp.
    pub submitted_at: DateTime<Utc>,
}

impl SubmittedRecord {
    /// Submitter's full name, as shown in logs.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Errors raised by [`RecordStore`] implementations.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A query failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Schema migrations could not be applied.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A row could not be mapped into a [`SubmittedRecord`].
    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord {
        /// The offending record id
        id: String,
        /// What was wrong with it
        reason: String,
    },
}

/// Persistence collaborator for submitted records.
///
/// No transactional guarantees beyond single-row atomicity are expected.
///
/// The methods return boxed futures so that the trait stays object safe and
/// can be shared across HTTP handlers as `Arc<dyn RecordStore>`.
pub trait RecordStore: Send + Sync {
    /// Look up a record by id.
    ///
    /// Returns `Ok(None)` when no such record exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be queried.
    fn get_by_id<'a>(
        &'a self,
        id: &'a RecordId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SubmittedRecord>, StoreError>> + Send + 'a>>;

    /// Insert a new record and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    fn insert<'a>(
        &'a self,
        record: &'a SubmittedRecord,
    ) -> Pin<Box<dyn Future<Output = Result<RecordId, StoreError>> + Send + 'a>>;
}
