//! Alert rendering and delivery
//!
//! The [`EventHandler`] is the observer subscribed to the live tree. It turns events into
//! rendered [`Alert`]s and hands them to every configured [`AlertRoute`]:
//!
//! ```text
//! Event → template lookup → render → [email, sms, webhook] → AlertSink::send per recipient
//! ```

mod email;
mod handler;
mod sms;
mod webhook;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AlertsConfig;
use crate::events::EventKind;

pub use email::EmailSink;
pub use handler::EventHandler;
pub use sms::SmsSink;
pub use webhook::WebhookSink;

/// A rendered alert, ready to be delivered
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub kind: EventKind,

    /// Label of the entity the event was raised for, e.g. `Host web1`
    pub subject: String,

    pub text: String,
}

/// Delivers a rendered alert to a single recipient
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, recipient: &str, alert: &Alert) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Email,
    Sms,
    Webhook,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Webhook => "webhook",
        })
    }
}

/// A sink together with the recipients it delivers to
#[derive(Clone)]
pub struct AlertRoute {
    pub channel: Channel,
    pub recipients: Vec<String>,
    pub sink: Arc<dyn AlertSink>,
}

impl AlertRoute {
    pub fn new(channel: Channel, recipients: Vec<String>, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            channel,
            recipients,
            sink,
        }
    }
}

impl fmt::Debug for AlertRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertRoute")
            .field("channel", &self.channel)
            .field("recipients", &self.recipients)
            .finish_non_exhaustive()
    }
}

/// Build the configured routes in delivery order: email, sms, webhook
pub fn routes_from_config(
    config: &AlertsConfig,
    timeout: Duration,
) -> anyhow::Result<Vec<AlertRoute>> {
    let mut routes = vec![];

    if let Some(email) = &config.email {
        routes.push(AlertRoute::new(
            Channel::Email,
            email.recipients.clone(),
            Arc::new(EmailSink::new(email)?),
        ));
    }

    if let Some(sms) = &config.sms {
        routes.push(AlertRoute::new(
            Channel::Sms,
            sms.recipients.clone(),
            Arc::new(SmsSink::new(sms, timeout)?),
        ));
    }

    if let Some(webhook) = &config.webhook {
        routes.push(AlertRoute::new(
            Channel::Webhook,
            webhook.recipients.clone(),
            Arc::new(WebhookSink::new(timeout)?),
        ));
    }

    Ok(routes)
}
