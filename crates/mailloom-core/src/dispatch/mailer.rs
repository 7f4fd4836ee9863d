//! SMTP delivery through a company's outbound servers

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use mailloom_common::{Error, Result};
use mailloom_storage::models::MailServer;
use std::time::Duration;

/// A single rendered email ready for delivery
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub from: String,
    pub reply_to: Option<String>,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivery seam. The production implementation speaks SMTP through the
/// given server's credentials; tests substitute a recording fake.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, server: &MailServer, email: &OutgoingEmail) -> Result<()>;
}

/// Mailer backed by lettre's async SMTP transport
pub struct SmtpMailer {
    timeout: Duration,
}

impl SmtpMailer {
    /// Create a new SMTP mailer
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }

    fn build_message(email: &OutgoingEmail) -> Result<Message> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| Error::Smtp(format!("Invalid from address: {}", e)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| Error::Smtp(format!("Invalid to address: {}", e)))?;

        let mut builder = Message::builder().from(from).to(to).subject(&email.subject);

        if let Some(reply_to) = &email.reply_to {
            let reply_to: Mailbox = reply_to
                .parse()
                .map_err(|e| Error::Smtp(format!("Invalid reply-to address: {}", e)))?;
            builder = builder.reply_to(reply_to);
        }

        builder
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())
            .map_err(|e| Error::Smtp(format!("Failed to build email: {}", e)))
    }
}

impl Default for SmtpMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, server: &MailServer, email: &OutgoingEmail) -> Result<()> {
        let message = Self::build_message(email)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&server.host)
            .map_err(|e| Error::Smtp(format!("Failed to create SMTP transport: {}", e)))?
            .port(server.port as u16)
            .credentials(Credentials::new(
                server.username.clone(),
                server.password.clone(),
            ))
            .timeout(Some(self.timeout))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| Error::Smtp(e.to_string()))?;

        Ok(())
    }
}
