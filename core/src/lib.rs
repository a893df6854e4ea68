//! # Complaints Core
//!
//! Domain types and collaborator traits shared by the producer and consumer
//! services.
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────────┐  insert   ┌──────────────┐
//! │   Producer   │──────────►│ RecordStore  │◄───────────┐
//! │ POST /submit │           └──────────────┘            │ get_by_id
//! └──────┬───────┘                                       │
//!        │ publish(ComplaintMessage)              ┌──────┴────────┐
//!        ▼                                        │ MessageHandler │
//! ┌──────────────┐  BrokerConnection::poll  ┌─────┴────────────────┤
//! │    Broker    │─────────────────────────►│  Subscription Loop   │
//! └──────────────┘                          └──────────┬───────────┘
//!                                                      │ send
//!                                               ┌──────▼──────┐
//!                                               │ EmailSender │
//!                                               └─────────────┘
//! ```
//!
//! The broker abstraction ([`broker`]) is deliberately small: connect, poll
//! with a bounded wait, close. Everything the consumption engine needs to be
//! testable without a running broker lives behind these traits.
//!
//! ## Delivery Semantics
//!
//! At-least-once. A [`ComplaintMessage`] only carries a reference to a
//! [`SubmittedRecord`]; consumers re-read the record from the store, so a
//! duplicate delivery produces at most a duplicate acknowledgement email.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod broker;
pub mod email;
pub mod handler;
pub mod message;
pub mod publish;
pub mod record;

pub use broker::{BrokerConnection, BrokerConnector, BrokerError, BrokerRecord, TopicPartition};
pub use email::{EmailError, EmailSender, OutgoingEmail};
pub use handler::{HandlerError, MessageHandler};
pub use message::ComplaintMessage;
pub use publish::{ComplaintPublisher, PublishError};
pub use record::{Attachment, RecordId, RecordStore, StoreError, SubmittedRecord};

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
