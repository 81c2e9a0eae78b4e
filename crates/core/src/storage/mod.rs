//! Content-addressed storage.
//!
//! A `ContentStore` accepts bytes or JSON and answers with the content
//! identifier derived from the payload. A `MediaSource` retrieves generated
//! media from its direct locator so it can be pinned.

mod media;
mod pinata;

pub use media::HttpMediaSource;
pub use pinata::PinataStore;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while uploading to content-addressed storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Storage quota or rate limit hit.
    #[error("storage quota or rate limit exceeded")]
    QuotaExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Payload could not be encoded.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Media could not be retrieved from its locator.
    #[error("failed to fetch media from {url}: {message}")]
    MediaFetch { url: String, message: String },

    /// Store not configured (missing credentials, etc.).
    #[error("Storage not configured: {0}")]
    NotConfigured(String),
}

/// Identifier of a stored object, derived from its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentAddress(String);

impl ContentAddress {
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `ipfs://<cid>` form used inside metadata records.
    pub fn uri(&self) -> String {
        format!("ipfs://{}", self.0)
    }

    /// Browsable URL through an HTTP gateway.
    pub fn gateway_url(&self, gateway: &str) -> String {
        format!("{}/{}", gateway.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A content-addressed store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Upload raw bytes under a human-readable name.
    async fn upload_bytes(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ContentAddress, StorageError>;

    /// Upload a JSON document under a human-readable name.
    async fn upload_json(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<ContentAddress, StorageError>;
}

/// Retrieves media bytes from a direct locator.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError>;
}
