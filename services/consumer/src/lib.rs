//! Complaint consumer service.
//!
//! Subscribes to the complaints topic and answers every submission with an
//! acknowledgement email, while serving health and readiness endpoints.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod acknowledgement;
pub mod config;
pub mod server;

pub use acknowledgement::{AcknowledgementHandler, compose_acknowledgement};
pub use config::{Config, ConfigError, EmailTransport, KafkaEnvEcho};
pub use server::{AppState, build_router};
