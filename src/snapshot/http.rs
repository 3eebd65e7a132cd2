use std::time::Duration;

use async_trait::async_trait;
use tracing::{instrument, trace};

use super::SnapshotSource;
use crate::config::SourceConfig;
use crate::error::FetchError;

/// Fetches the status document with a plain HTTP GET
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    url: String,

    /// HTTP client (reused across polls)
    client: reqwest::Client,
}

impl HttpSnapshotSource {
    pub fn new(config: &SourceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            url: config.url.clone(),
            client,
        })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        trace!("requesting status document");

        let request_error = |source: reqwest::Error| FetchError::Request {
            url: self.url.clone(),
            source,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: response.status(),
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        trace!("received {} bytes", body.len());

        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
