//! Complaint producer service.
//!
//! Accepts submissions over HTTP, persists them and publishes a reference
//! for the consumer. Publishing is best effort; persisting is not.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod server;
pub mod submit;

pub use config::{Config, ConfigError};
pub use server::{AppState, build_router};
pub use submit::{MAX_ATTACHMENT_BYTES, MAX_BODY_BYTES, QUEUE_WARNING, SubmitRequest, SubmitResponse};
