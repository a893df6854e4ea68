//! Message handler seam between the subscription loop and business logic.

use crate::email::EmailError;
use crate::message::ComplaintMessage;
use crate::record::StoreError;
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a [`MessageHandler`].
///
/// The subscription loop logs these and moves on; a failed message is still
/// considered consumed.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Record lookup failed.
    #[error("Record lookup failed: {0}")]
    Store(#[from] StoreError),

    /// Email delivery failed.
    #[error("Email delivery failed: {0}")]
    Email(#[from] EmailError),

    /// Any other handler-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Processes one decoded [`ComplaintMessage`].
///
/// Implementors must be `Send + Sync + 'static` because the handler is shared
/// with the background consumer task.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    /// Handle a message.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when processing fails. Errors never stop the
    /// consumer; they are logged and the next record is processed.
    async fn handle(&self, message: ComplaintMessage) -> Result<(), HandlerError>;
}
