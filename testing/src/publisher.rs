//! Publisher that records instead of producing to a broker.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use complaints_core::{ComplaintMessage, ComplaintPublisher, PublishError};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Captures every published [`ComplaintMessage`].
#[derive(Clone, Debug, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<ComplaintMessage>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingPublisher {
    /// Create a publisher that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a publisher that rejects every message.
    #[must_use]
    pub fn failing() -> Self {
        let publisher = Self::new();
        publisher.set_failing(true);
        publisher
    }

    /// Toggle failure mode.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages published so far.
    #[must_use]
    pub fn published(&self) -> Vec<ComplaintMessage> {
        self.published.lock().unwrap().clone()
    }
}

impl ComplaintPublisher for RecordingPublisher {
    fn publish<'a>(
        &'a self,
        message: &'a ComplaintMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PublishError::Delivery {
                    topic: "complaints.v1".to_string(),
                    reason: "broker unavailable".to_string(),
                });
            }
            self.published.lock().unwrap().push(message.clone());
            Ok(())
        })
    }
}
