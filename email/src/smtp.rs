//! SMTP email sender using Lettre.

use complaints_core::{EmailError, EmailSender, OutgoingEmail};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// SMTP connection settings.
///
/// # Default Values
///
/// - `host`: `mailhog`
/// - `port`: 1025
/// - `starttls`: off (plain SMTP, as spoken by `MailHog`)
/// - `timeout`: 10 seconds
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Sender address for the `From` header.
    pub from: String,
    /// Username for AUTH; only used together with `password`.
    pub username: Option<String>,
    /// Password for AUTH; only used together with `username`.
    pub password: Option<String>,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
    /// Per-connection timeout.
    pub timeout: Duration,
}

impl SmtpSettings {
    /// Plain SMTP to `mailhog:1025` sending as `from`.
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            host: "mailhog".to_string(),
            port: 1025,
            from: from.into(),
            username: None,
            password: None,
            starttls: false,
            timeout: Duration::from_secs(10),
        }
    }

    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Some(Credentials::new(username.clone(), password.clone()))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from", &self.from)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("starttls", &self.starttls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`EmailSender`] that delivers over SMTP.
///
/// A new transport is built for each email. Lettre's SMTP transport is
/// blocking, so sending runs on the blocking thread pool.
///
/// # Examples
///
/// ```ignore
/// use complaints_email::{SmtpEmailSender, SmtpSettings};
///
/// let sender = SmtpEmailSender::new(SmtpSettings::new("support@example.com"));
/// sender.send(&OutgoingEmail::new("jane@example.com", "Hello", "Hi Jane")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SmtpEmailSender {
    settings: SmtpSettings,
}

impl SmtpEmailSender {
    /// Create a sender.
    #[must_use]
    pub const fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// The settings in use.
    #[must_use]
    pub const fn settings(&self) -> &SmtpSettings {
        &self.settings
    }

    /// Assemble the MIME message for `email`.
    ///
    /// Emails with an attachment become `multipart/mixed`: the plain-text
    /// body followed by the file as `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::InvalidAddress`] for unparseable addresses and
    /// [`EmailError::Build`] if the message cannot be assembled.
    pub fn build_message(&self, email: &OutgoingEmail) -> Result<Message, EmailError> {
        let builder = Message::builder()
            .from(parse_mailbox(&self.settings.from)?)
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.as_str());

        let message = match &email.attachment {
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(email.body.clone()),
            Some(attachment) => {
                let content_type = ContentType::parse("application/octet-stream")
                    .map_err(|e| EmailError::Build(e.to_string()))?;
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(email.body.clone()))
                        .singlepart(
                            Attachment::new(attachment.name.clone())
                                .body(attachment.data.clone(), content_type),
                        ),
                )
            }
        };

        message.map_err(|e| EmailError::Build(e.to_string()))
    }

    fn build_transport(&self) -> Result<SmtpTransport, EmailError> {
        let builder = if self.settings.starttls {
            SmtpTransport::starttls_relay(&self.settings.host)
                .map_err(|e| EmailError::Transport(format!("SMTP relay error: {e}")))?
        } else {
            SmtpTransport::builder_dangerous(self.settings.host.as_str())
        };

        let mut builder = builder
            .port(self.settings.port)
            .timeout(Some(self.settings.timeout));
        if let Some(credentials) = self.settings.credentials() {
            builder = builder.credentials(credentials);
        }
        Ok(builder.build())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address.parse().map_err(|e: lettre::address::AddressError| EmailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

impl EmailSender for SmtpEmailSender {
    fn send<'a>(
        &'a self,
        email: &'a OutgoingEmail,
    ) -> Pin<Box<dyn Future<Output = Result<(), EmailError>> + Send + 'a>> {
        Box::pin(async move {
            let message = self.build_message(email)?;
            let mailer = self.build_transport()?;

            tokio::task::spawn_blocking(move || {
                mailer
                    .send(&message)
                    .map_err(|e| EmailError::Transport(e.to_string()))
            })
            .await
            .map_err(|e| EmailError::Transport(format!("Email task failed: {e}")))??;

            tracing::info!(
                to = %email.to,
                subject = %email.subject,
                attachment = email.attachment.is_some(),
                host = %self.settings.host,
                "Email sent"
            );
            Ok(())
        })
    }
}
