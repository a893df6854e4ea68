//! # Complaints Email
//!
//! [`EmailSender`](complaints_core::EmailSender) implementations:
//!
//! - [`SmtpEmailSender`] - real delivery over SMTP (plain or STARTTLS,
//!   optional AUTH), e.g. to `MailHog` in development
//! - [`ConsoleEmailSender`] - logs emails to stdout

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod console;
mod smtp;

pub use console::ConsoleEmailSender;
pub use smtp::{SmtpEmailSender, SmtpSettings};
