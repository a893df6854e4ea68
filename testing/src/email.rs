//! Email sender that records instead of sending.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use complaints_core::{EmailError, EmailSender, OutgoingEmail};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Captures every email passed to [`EmailSender::send`].
///
/// With [`failing`](Self::failing) set, sends are rejected with
/// [`EmailError::Transport`] and nothing is recorded. Addresses passed to
/// [`reject`](Self::reject) fail the same way while others go through.
#[derive(Clone, Debug, Default)]
pub struct RecordingEmailSender {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    failure: Arc<Mutex<Option<String>>>,
    rejected: Arc<Mutex<Vec<String>>>,
}

impl RecordingEmailSender {
    /// Create a sender that accepts every email.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sender that rejects every email with `reason`.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        let sender = Self::new();
        sender.fail_with(Some(reason.into()));
        sender
    }

    /// Switch failure mode on (`Some`) or off (`None`).
    pub fn fail_with(&self, reason: Option<String>) {
        *self.failure.lock().unwrap() = reason;
    }

    /// Reject every email addressed to `address`.
    pub fn reject(&self, address: impl Into<String>) {
        self.rejected.lock().unwrap().push(address.into());
    }

    /// Emails sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of emails sent.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Emails sent to `address`.
    #[must_use]
    pub fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|email| email.to == address)
            .cloned()
            .collect()
    }
}

impl EmailSender for RecordingEmailSender {
    fn send<'a>(
        &'a self,
        email: &'a OutgoingEmail,
    ) -> Pin<Box<dyn Future<Output = Result<(), EmailError>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(reason) = self.failure.lock().unwrap().clone() {
                return Err(EmailError::Transport(reason));
            }
            if self.rejected.lock().unwrap().contains(&email.to) {
                return Err(EmailError::Transport(format!("{} rejected", email.to)));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sent_email() {
        let sender = RecordingEmailSender::new();
        let email = OutgoingEmail::new("a@example.com", "Hi", "Body");

        sender.send(&email).await.unwrap();

        assert_eq!(sender.sent(), vec![email]);
        assert_eq!(sender.sent_to("a@example.com").len(), 1);
        assert!(sender.sent_to("b@example.com").is_empty());
    }

    #[tokio::test]
    async fn failing_sender_records_nothing() {
        let sender = RecordingEmailSender::failing("smtp down");
        let result = sender
            .send(&OutgoingEmail::new("a@example.com", "Hi", "Body"))
            .await;

        assert!(matches!(result, Err(EmailError::Transport(ref r)) if r == "smtp down"));
        assert_eq!(sender.count(), 0);
    }
    #[tokio::test]
    async fn rejected_address_fails_alone() {
        let sender = RecordingEmailSender::new();
        sender.reject("bounce@example.com");

        let bounced = sender
            .send(&OutgoingEmail::new("bounce@example.com", "Hi", "Body"))
            .await;
        sender
            .send(&OutgoingEmail::new("a@example.com", "Hi", "Body"))
            .await
            .unwrap();

        assert!(matches!(bounced, Err(EmailError::Transport(_))));
        assert_eq!(sender.count(), 1);
        assert_eq!(sender.sent_to("a@example.com").len(), 1);
    }
}
