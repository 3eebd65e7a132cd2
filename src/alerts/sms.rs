use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use super::{Alert, AlertSink};
use crate::config::SmsConfig;
use crate::xmlrpc;

/// Sends alerts as text messages through an XML-RPC SMS gateway
#[derive(Debug, Clone)]
pub struct SmsSink {
    url: String,
    from_msisdn: String,
    method: String,
    client: reqwest::Client,
}

impl SmsSink {
    pub fn new(config: &SmsConfig, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            url: config.url.clone(),
            from_msisdn: config.from_msisdn.clone(),
            method: config.method.clone(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl AlertSink for SmsSink {
    #[instrument(skip(self, alert), fields(kind = %alert.kind))]
    async fn send(&self, recipient: &str, alert: &Alert) -> anyhow::Result<()> {
        xmlrpc::call(
            &self.client,
            &self.url,
            &self.method,
            &[&self.from_msisdn, recipient, &alert.text],
        )
        .await
    }
}
