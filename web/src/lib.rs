//! Axum integration shared by the complaints services.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract** and validate the JSON body
//! 3. **Call collaborators** (`RecordStore`, `ComplaintPublisher`, `EmailSender`)
//! 4. **Map errors** to [`AppError`], which renders `{"code", "message"}`
//!
//! Health handlers live in [`handlers`]; both routers mount them.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handlers;

pub use error::{AppError, DATABASE_ERROR_MESSAGE};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
