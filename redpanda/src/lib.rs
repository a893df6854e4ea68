//! Kafka-protocol broker client for the complaints pipeline.
//!
//! Works with Redpanda, Apache Kafka or any other Kafka-compatible broker
//! through rdkafka (librdkafka).
//!
//! # Consumer side
//!
//! [`KafkaConnector`] implements [`BrokerConnector`](complaints_core::BrokerConnector):
//! every `connect` builds a fresh group consumer subscribed to one topic,
//! and every `poll` waits at most the given timeout for one record.
//!
//! ```text
//! ┌──────────────────┐ connect ┌────────────────┐ recv (≤ 5s) ┌────────┐
//! │ SubscriptionLoop │────────►│ KafkaConnection│◄────────────│ Broker │
//! └──────────────────┘         └────────────────┘             └────────┘
//! ```
//!
//! # Delivery Semantics
//!
//! **At-least-once** with auto-commit: offsets of delivered records are
//! committed in the background every 5 seconds. A crash between delivery
//! and commit causes redelivery, so handlers must tolerate duplicates.
//!
//! # Producer side
//!
//! [`KafkaPublisher`] implements
//! [`ComplaintPublisher`](complaints_core::ComplaintPublisher), keyed by
//! record id.
//!
//! # Example
//!
//! ```no_run
//! use complaints_redpanda::{KafkaSettings, wait_for_broker};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let settings = KafkaSettings::new("localhost:9092", "complaints.v1");
//! if !wait_for_broker(&settings, Duration::from_secs(120)).await {
//!     eprintln!("broker still unreachable");
//! }
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod consumer;
pub mod error;
pub mod publisher;
pub mod settings;

pub use consumer::{KafkaConnection, KafkaConnector, create_consumer, wait_for_broker};
pub use error::classify;
pub use publisher::KafkaPublisher;
pub use settings::{
    DEFAULT_GROUP_ID, KafkaSettings, SaslSettings, consumer_config, producer_config,
    resolve_group_id,
};
