//! Outbound email capability.

use crate::record::Attachment;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// A fully composed email ready to hand to an [`EmailSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Optional file attached as `application/octet-stream`.
    pub attachment: Option<Attachment>,
}

impl OutgoingEmail {
    /// Create a plain email without attachment.
    #[must_use]
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            attachment: None,
        }
    }

    /// Attach a file.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Errors from email delivery.
///
/// Every failure is an explicit value so callers can isolate it; sending must
/// never bring down the caller.
#[derive(Error, Debug, Clone)]
pub enum EmailError {
    /// Sender or recipient address could not be parsed.
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress {
        /// The rejected address
        address: String,
        /// Parser message
        reason: String,
    },

    /// The MIME message could not be assembled.
    #[error("Failed to build email: {0}")]
    Build(String),

    /// The transport rejected or failed to deliver the message.
    #[error("Failed to send email: {0}")]
    Transport(String),
}

/// Email delivery collaborator.
pub trait EmailSender: Send + Sync {
    /// Send an email.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] if the message cannot be built or delivered.
    fn send<'a>(
        &'a self,
        email: &'a OutgoingEmail,
    ) -> Pin<Box<dyn Future<Output = Result<(), EmailError>> + Send + 'a>>;
}
