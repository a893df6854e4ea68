//! Console email sender for development.

use complaints_core::{EmailError, EmailSender, OutgoingEmail};
use std::future::Future;
use std::pin::Pin;

/// Logs emails instead of sending them.
///
/// Selected with `EMAIL_TRANSPORT=console` when no SMTP server is around.
#[derive(Clone, Debug, Default)]
pub struct ConsoleEmailSender;

impl ConsoleEmailSender {
    /// Create a console sender.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EmailSender for ConsoleEmailSender {
    fn send<'a>(
        &'a self,
        email: &'a OutgoingEmail,
    ) -> Pin<Box<dyn Future<Output = Result<(), EmailError>> + Send + 'a>> {
        Box::pin(async move {
            tracing::info!(
                to = %email.to,
                subject = %email.subject,
                attachment = email.attachment.as_ref().map(|a| a.name.as_str()),
                "📧 Email (console transport)"
            );
            println!("\n──────────────────────────────────────────────────────────────");
            println!("To: {}", email.to);
            println!("Subject: {}", email.subject);
            if let Some(attachment) = &email.attachment {
                println!("Attachment: {} ({} bytes)", attachment.name, attachment.size());
            }
            println!("──────────────────────────────────────────────────────────────");
            println!("{}", email.body);
            println!("──────────────────────────────────────────────────────────────\n");
            Ok(())
        })
    }
}
