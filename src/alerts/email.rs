use anyhow::Context;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{instrument, trace};

use super::{Alert, AlertSink};
use crate::config::EmailConfig;

/// Sends alerts as plain text mails through an unauthenticated SMTP relay
pub struct EmailSink {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailSink {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let from = config
            .from
            .parse()
            .with_context(|| format!("invalid sender address '{}'", config.from))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .build();

        Ok(Self { from, transport })
    }

    fn build_message(&self, recipient: &str, alert: &Alert) -> anyhow::Result<Message> {
        let to: Mailbox = recipient
            .parse()
            .with_context(|| format!("invalid recipient address '{recipient}'"))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(format!("{}: {}", alert.kind, alert.subject))
            .header(ContentType::TEXT_PLAIN)
            .body(alert.text.clone())?;

        Ok(message)
    }
}

#[async_trait]
impl AlertSink for EmailSink {
    #[instrument(skip(self, alert), fields(kind = %alert.kind))]
    async fn send(&self, recipient: &str, alert: &Alert) -> anyhow::Result<()> {
        let message = self.build_message(recipient, alert)?;

        let response = self
            .transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;
        trace!("smtp answered {}", response.code());

        Ok(())
    }
}
