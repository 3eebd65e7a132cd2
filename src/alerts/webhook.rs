use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{instrument, trace};

use super::{Alert, AlertSink};

/// Posts alerts as JSON to the recipient URL
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    #[instrument(skip(self, alert), fields(kind = %alert.kind))]
    async fn send(&self, recipient: &str, alert: &Alert) -> anyhow::Result<()> {
        let payload = json!({
            "kind": alert.kind,
            "subject": alert.subject,
            "message": alert.text,
            "timestamp": Utc::now().to_rfc3339()
        });

        let response = self
            .client
            .post(recipient)
            .json(&payload)
            .send()
            .await
            .context("failed to send webhook alert")?;

        if !response.status().is_success() {
            bail!("webhook alert failed with status: {}", response.status());
        }

        trace!("webhook accepted alert");
        Ok(())
    }
}
