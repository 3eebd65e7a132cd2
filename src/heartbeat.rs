use std::time::Duration;

use async_trait::async_trait;
use sysinfo::System;
use tracing::{instrument, trace};

use crate::config::HeartbeatConfig;
use crate::xmlrpc;

/// Reports that the agent itself is alive
#[async_trait]
pub trait Heartbeat: Send + Sync {
    async fn report(&self) -> anyhow::Result<()>;
}

/// Sends `method(service, status, hostname)` to an XML-RPC status collector
#[derive(Debug, Clone)]
pub struct XmlRpcHeartbeat {
    url: String,
    method: String,
    service: String,
    status: String,
    hostname: String,
    client: reqwest::Client,
}

impl XmlRpcHeartbeat {
    pub fn new(config: &HeartbeatConfig, timeout: Duration) -> anyhow::Result<Self> {
        let hostname = System::host_name().unwrap_or_else(|| String::from("unknown"));

        Ok(Self {
            url: config.url.clone(),
            method: config.method.clone(),
            service: config.service.clone(),
            status: config.status.clone(),
            hostname,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl Heartbeat for XmlRpcHeartbeat {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn report(&self) -> anyhow::Result<()> {
        trace!("reporting {} as {}", self.service, self.status);
        xmlrpc::call(
            &self.client,
            &self.url,
            &self.method,
            &[&self.service, &self.status, &self.hostname],
        )
        .await
    }
}
