//! SMTP email sink.

use crate::{EmailMessage, EmailSink};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use fmswatch::config::{EmailConfig, SmtpSecurity};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::debug;

/// Sends one plain-text message per call through an SMTP relay.
///
/// Must be constructed inside a tokio runtime.
pub struct SmtpEmailSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSink {
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| anyhow!("SMTP host is not configured"))?;
        let from: Mailbox = config
            .from
            .as_deref()
            .ok_or_else(|| anyhow!("Sender address is not configured"))?
            .parse()
            .context("Invalid sender address")?;

        let builder = match config.security {
            SmtpSecurity::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .with_context(|| format!("Failed to set up STARTTLS relay '{}'", host))?,
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .with_context(|| format!("Failed to set up TLS relay '{}'", host))?,
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        debug!(
            host = %host,
            port = config.smtp_port,
            security = ?config.security,
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

/// Builds the MIME message: every recipient in `To`, UTF-8 plain text.
pub fn build_message(from: &Mailbox, email: &EmailMessage) -> Result<Message> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN);

    for address in &email.to {
        let mailbox: Mailbox = address
            .parse()
            .with_context(|| format!("Invalid recipient address '{}'", address))?;
        builder = builder.to(mailbox);
    }

    builder
        .body(email.body.clone())
        .context("Failed to build email message")
}

#[async_trait]
impl EmailSink for SmtpEmailSink {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = build_message(&self.from, message)?;
        self.transport
            .send(email)
            .await
            .context("SMTP delivery failed")?;
        Ok(())
    }
}
