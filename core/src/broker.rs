//! Message bus abstraction consumed by the subscription loop.
//!
//! The consumer never iterates an open-ended stream. Instead a
//! [`BrokerConnection`] is *polled* with a bounded wait, which hands control
//! back to the loop at least once per poll timeout so it can observe a stop
//! request even when the topic is idle.
//!
//! ```text
//!            probe()                 connect()
//! DISCONNECTED ──────► (reachable?) ───────────► ASSIGNED
//!                                                   │ poll(timeout)
//!                                                   ▼
//!                     close() ◄── BrokerError ── CONSUMING
//! ```
//!
//! # Implementations
//!
//! - `KafkaConnector` in `complaints-redpanda` - production (rdkafka)
//! - `ScriptedConnector` in `complaints-testing` - deterministic fakes for tests

use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Connection-level faults reported by a broker client.
///
/// These are steady-state events for a long-lived consumer, not exceptional
/// ones: every variant results in the connection being closed and retried
/// after a backoff.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// No broker in the bootstrap list could be reached.
    #[error("No brokers available: {0}")]
    NoBrokersAvailable(String),

    /// The consumer group coordinator is missing or moved.
    #[error("Group coordinator unavailable: {0}")]
    CoordinatorUnavailable(String),

    /// Committing consumed offsets failed.
    #[error("Offset commit failed: {0}")]
    CommitFailed(String),

    /// Any other network or protocol error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The client rejected its configuration.
    #[error("Invalid client configuration: {0}")]
    Configuration(String),
}

impl BrokerError {
    /// Short stable label for logs and metrics.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::NoBrokersAvailable(_) => "no_brokers_available",
            Self::CoordinatorUnavailable(_) => "coordinator_unavailable",
            Self::CommitFailed(_) => "commit_failed",
            Self::Transport(_) => "transport",
            Self::Configuration(_) => "configuration",
        }
    }
}

/// A single delivered record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerRecord {
    /// Source topic.
    pub topic: String,
    /// Source partition.
    pub partition: i32,
    /// Offset within the partition.
    pub offset: i64,
    /// Optional message key.
    pub key: Option<Vec<u8>>,
    /// Raw payload; `None` for tombstones.
    pub payload: Option<Vec<u8>>,
}

impl BrokerRecord {
    /// Create a record without a key.
    #[must_use]
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, payload: Option<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            key: None,
            payload,
        }
    }

    /// Lossy, length-capped rendering of the payload for diagnostics.
    #[must_use]
    pub fn payload_preview(&self) -> String {
        const MAX_PREVIEW: usize = 512;

        let Some(payload) = &self.payload else {
            return String::from("<none>");
        };
        let shown = &payload[..payload.len().min(MAX_PREVIEW)];
        let mut preview = String::from_utf8_lossy(shown).into_owned();
        if payload.len() > MAX_PREVIEW {
            preview.push_str(&format!("... ({} bytes total)", payload.len()));
        }
        preview
    }
}

/// A topic partition owned by a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPartition {
    /// Topic name.
    pub topic: String,
    /// Partition number.
    pub partition: i32,
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.topic, self.partition)
    }
}

/// An established subscription, exclusively owned by the consumer task.
pub trait BrokerConnection: Send {
    /// Partitions currently assigned to this connection.
    ///
    /// Assignment may still be in progress right after connecting, in which
    /// case the list is empty.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] if the client cannot report its assignment.
    fn assignment(&self) -> Result<Vec<TopicPartition>, BrokerError>;

    /// Wait at most `timeout` for the next batch of records.
    ///
    /// An empty batch means the wait elapsed without traffic.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] on any connection-level fault.
    fn poll(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<BrokerRecord>, BrokerError>> + Send;

    /// Leave the group and release the connection.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] if the client reports a failure while closing.
    fn close(self) -> impl Future<Output = Result<(), BrokerError>> + Send;
}

/// Factory for [`BrokerConnection`]s.
pub trait BrokerConnector: Send + Sync {
    /// Connection type produced by [`connect`](Self::connect).
    type Connection: BrokerConnection + 'static;

    /// Check that the broker is reachable using a throwaway client.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] if the broker cannot be reached.
    fn probe(&self) -> impl Future<Output = Result<(), BrokerError>> + Send;

    /// Build a client and subscribe it to the configured topic.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] if the client cannot be created or subscribed.
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, BrokerError>> + Send;
}
