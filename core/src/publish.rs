//! Producer-side publishing seam.

use crate::message::ComplaintMessage;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors from publishing a [`ComplaintMessage`].
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    /// The message could not be encoded.
    #[error("Failed to serialize message: {0}")]
    Serialization(String),

    /// The broker did not acknowledge the message.
    #[error("Publish failed for topic '{topic}': {reason}")]
    Delivery {
        /// Destination topic
        topic: String,
        /// Reason reported by the client
        reason: String,
    },
}

/// Publishes complaint references to the message bus.
pub trait ComplaintPublisher: Send + Sync {
    /// Publish a message and wait for the broker acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if encoding or delivery fails.
    fn publish<'a>(
        &'a self,
        message: &'a ComplaintMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>>;
}
