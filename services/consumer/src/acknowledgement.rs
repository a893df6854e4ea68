//! Acknowledgement emails for submitted complaints.

use async_trait::async_trait;
use complaints_core::{
    ComplaintMessage, EmailSender, HandlerError, MessageHandler, OutgoingEmail, RecordStore,
    SubmittedRecord,
};
use std::sync::Arc;

/// Compose the acknowledgement for `record`.
///
/// The record id doubles as the ticket reference. An attachment is echoed
/// back to the submitter, and mentioned in the body with its size.
#[must_use]
pub fn compose_acknowledgement(record: &SubmittedRecord) -> OutgoingEmail {
    let mut lines = vec![
        format!("Hello {},", record.first_name),
        String::new(),
        "Thank you for reaching out to us. We have successfully received your request regarding:"
            .to_string(),
        format!("\"{}\"", record.subject),
        String::new(),
        "Details you provided:".to_string(),
        String::new(),
        record.body.clone(),
        String::new(),
        format!("Your reference ticket number is {}.", record.id),
    ];

    if let Some(attachment) = &record.attachment {
        lines.push(String::new());
        lines.push("We also received the following file with your request:".to_string());
        lines.push(format!("- {} ({} bytes)", attachment.name, attachment.size()));
    }

    lines.extend([
        String::new(),
        "Best regards,".to_string(),
        "CANON Support Team".to_string(),
    ]);

    let email = OutgoingEmail::new(
        record.email.clone(),
        format!("Thank you for contacting us – Ticket {}", record.id),
        lines.join("\n"),
    );
    match &record.attachment {
        Some(attachment) => email.with_attachment(attachment.clone()),
        None => email,
    }
}

/// [`MessageHandler`] that answers each complaint with an acknowledgement.
///
/// Every failure stops at this boundary and the message counts as handled by
/// the subscription loop. A message without an id or an unknown record lands
/// in `acknowledgements_skipped_total{reason}`. Store and email errors land
/// in `acknowledgement_failures_total{stage}`. Only
/// `acknowledgements_sent_total` counts delivered acknowledgements.
#[derive(Clone)]
pub struct AcknowledgementHandler {
    store: Arc<dyn RecordStore>,
    email: Arc<dyn EmailSender>,
}

impl AcknowledgementHandler {
    /// Create a handler over the given collaborators.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, email: Arc<dyn EmailSender>) -> Self {
        Self { store, email }
    }
}

#[async_trait]
impl MessageHandler for AcknowledgementHandler {
    async fn handle(&self, message: ComplaintMessage) -> Result<(), HandlerError> {
        let Some(id) = message.record_id() else {
            tracing::warn!("Skipping message without id");
            metrics::counter!("acknowledgements_skipped_total", "reason" => "missing_id")
                .increment(1);
            return Ok(());
        };

        let record = match self.store.get_by_id(&id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!(id = %id, "Record not found");
                metrics::counter!("acknowledgements_skipped_total", "reason" => "not_found")
                    .increment(1);
                return Ok(());
            }
            Err(e) => {
                tracing::error!(id = %id, error = %e, "Record lookup failed");
                metrics::counter!("acknowledgement_failures_total", "stage" => "lookup")
                    .increment(1);
                return Ok(());
            }
        };

        let email = compose_acknowledgement(&record);
        if let Err(e) = self.email.send(&email).await {
            tracing::error!(id = %id, to = %email.to, error = %e, "Acknowledgement failed");
            metrics::counter!("acknowledgement_failures_total", "stage" => "send").increment(1);
            return Ok(());
        }

        tracing::info!(
            id = %id,
            to = %email.to,
            submitter = %record.full_name(),
            "Acknowledgement sent"
        );
        metrics::counter!("acknowledgements_sent_total").increment(1);
        Ok(())
    }
}
