//! Pinata IPFS pinning client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{ContentAddress, ContentStore, StorageError};
use crate::config::StorageConfig;

/// Content store backed by the Pinata pinning API.
pub struct PinataStore {
    client: Client,
    api_url: String,
    jwt: Option<String>,
}

impl PinataStore {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            jwt: config.jwt.clone().filter(|jwt| !jwt.is_empty()),
        })
    }

    fn jwt(&self) -> Result<&str, StorageError> {
        self.jwt
            .as_deref()
            .ok_or_else(|| StorageError::NotConfigured("storage.jwt is not set".to_string()))
    }

    async fn parse_pin_response(
        response: reqwest::Response,
    ) -> Result<ContentAddress, StorageError> {
        let status = response.status();
        if status == 429 {
            warn!("Pinata rate limit exceeded");
            return Err(StorageError::QuotaExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let pinned: PinResponse = response.json().await.map_err(|e| {
            StorageError::ParseError(format!("Failed to parse pin response: {}", e))
        })?;

        Ok(ContentAddress::new(pinned.ipfs_hash))
    }
}

#[async_trait]
impl ContentStore for PinataStore {
    fn name(&self) -> &str {
        "pinata"
    }

    async fn upload_bytes(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ContentAddress, StorageError> {
        let jwt = self.jwt()?;
        let url = format!("{}/pinning/pinFileToIPFS", self.api_url);
        debug!("Pinning file '{}' ({} bytes)", name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", json!({ "name": name }).to_string());

        let response = self
            .client
            .post(&url)
            .bearer_auth(jwt)
            .multipart(form)
            .send()
            .await?;

        Self::parse_pin_response(response).await
    }

    async fn upload_json(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<ContentAddress, StorageError> {
        let jwt = self.jwt()?;
        let url = format!("{}/pinning/pinJSONToIPFS", self.api_url);
        debug!("Pinning JSON '{}'", name);

        let body = json!({
            "pinataContent": value,
            "pinataMetadata": { "name": name },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(jwt)
            .json(&body)
            .send()
            .await?;

        Self::parse_pin_response(response).await
    }
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}
