//! Mock content store for testing.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::storage::{ContentAddress, ContentStore, StorageError};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub name: String,
    pub content_type: String,
    pub size_bytes: usize,
    pub address: ContentAddress,
}

/// Mock implementation of the ContentStore trait.
///
/// Addresses are derived from a SHA-256 of the payload, so identical content
/// always lands at the same address. Uploads whose name contains one of the
/// configured substrings fail with a 503 API error. Uploads can also be
/// delayed by name to force out-of-order completion.
#[derive(Debug, Clone)]
pub struct MockContentStore {
    /// Recorded successful uploads.
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    /// Name substrings that make an upload fail.
    failing: Arc<RwLock<Vec<String>>>,
    /// If set, the next upload fails with this error.
    next_error: Arc<RwLock<Option<StorageError>>>,
    /// Name substrings and how long matching uploads take.
    delays: Arc<RwLock<Vec<(String, Duration)>>>,
}

impl Default for MockContentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn address_for(bytes: &[u8]) -> ContentAddress {
    let digest = Sha256::digest(bytes);
    let hex: String = digest.iter().take(16).map(|b| format!("{:02x}", b)).collect();
    ContentAddress::new(format!("bafy{}", hex))
}

impl MockContentStore {
    /// Create a new mock store where every upload succeeds.
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delays: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Make every upload whose name contains `pattern` fail.
    pub async fn fail_uploads_containing(&self, pattern: impl Into<String>) {
        self.failing.write().await.push(pattern.into());
    }

    /// Make every upload whose name contains `pattern` take `delay`.
    pub async fn delay_uploads_containing(&self, pattern: impl Into<String>, delay: Duration) {
        self.delays.write().await.push((pattern.into(), delay));
    }

    /// Configure the next upload to fail with the given error.
    pub async fn set_next_error(&self, error: StorageError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded uploads, in completion order.
    pub async fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Get the number of successful uploads.
    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    async fn store(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<ContentAddress, StorageError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let delay = self
            .delays
            .read()
            .await
            .iter()
            .find(|(pattern, _)| name.contains(pattern.as_str()))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .failing
            .read()
            .await
            .iter()
            .any(|pattern| name.contains(pattern.as_str()))
        {
            return Err(StorageError::ApiError {
                status: 503,
                message: format!("mock storage failure for {}", name),
            });
        }

        let address = address_for(bytes);
        self.uploads.write().await.push(RecordedUpload {
            name: name.to_string(),
            content_type: content_type.to_string(),
            size_bytes: bytes.len(),
            address: address.clone(),
        });
        Ok(address)
    }
}

#[async_trait]
impl ContentStore for MockContentStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload_bytes(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ContentAddress, StorageError> {
        self.store(name, &bytes, content_type).await
    }

    async fn upload_json(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<ContentAddress, StorageError> {
        let bytes = serde_json::to_vec(value)?;
        self.store(name, &bytes, "application/json").await
    }
}
