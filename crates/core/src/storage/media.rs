use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{MediaSource, StorageError};

/// Downloads generated media over HTTP.
pub struct HttpMediaSource {
    client: Client,
}

impl HttpMediaSource {
    pub fn new(timeout: Duration) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        if url.trim().is_empty() {
            return Err(StorageError::MediaFetch {
                url: url.to_string(),
                message: "artifact has no media locator".to_string(),
            });
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StorageError::MediaFetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::MediaFetch {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| StorageError::MediaFetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);

        Ok(bytes.to_vec())
    }
}
