// src/services/mailer.rs

//! SMTP digest delivery.
//!
//! Composes a multipart/alternative message (plain text plus HTML, HTML
//! preferred) and sends it over an SMTPS relay. The SMTP password is read
//! from the environment variable named in the configuration at send time,
//! never from the configuration file itself.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::error::{AppError, Result};
use crate::models::MailConfig;

/// Outbound mail transport for the digest.
pub struct Mailer {
    config: MailConfig,
}

impl Mailer {
    /// Create a mailer, rejecting configs without sender and recipient.
    pub fn new(config: MailConfig) -> Result<Self> {
        if config.from.trim().is_empty() || config.to.trim().is_empty() {
            return Err(AppError::config(
                "mail.from and mail.to must be set to send the digest",
            ));
        }
        Ok(Self { config })
    }

    /// Deliver the digest. Failures are fatal and surfaced to the caller.
    pub fn send(&self, subject: &str, text: &str, html: &str) -> Result<()> {
        let message = self.compose(subject, text, html)?;

        let password = std::env::var(&self.config.password_env).map_err(|_| {
            AppError::config(format!(
                "SMTP password not found in environment variable {}",
                self.config.password_env
            ))
        })?;
        let credentials = Credentials::new(self.config.from.clone(), password);

        let transport = SmtpTransport::relay(&self.config.smtp_host)?
            .credentials(credentials)
            .build();
        transport.send(&message)?;

        log::info!("Digest sent to {}", self.config.to);
        Ok(())
    }

    /// Build the multipart message. Separate from `send` so composition is
    /// testable without a relay.
    fn compose(&self, subject: &str, text: &str, html: &str) -> Result<Message> {
        let from: Mailbox = self.config.from.parse()?;
        let to: Mailbox = self.config.to.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            ))?;
        Ok(message)
    }
}
