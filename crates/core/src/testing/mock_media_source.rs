//! Mock media source for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{MediaSource, StorageError};

/// Mock implementation of the MediaSource trait.
///
/// Returns a small payload derived from the URL; URLs registered with
/// [`MockMediaSource::fail_url`] fail with a fetch error.
#[derive(Debug, Clone, Default)]
pub struct MockMediaSource {
    failing: Arc<RwLock<HashSet<String>>>,
    fetched: Arc<RwLock<Vec<String>>>,
}

impl MockMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make fetches of `url` fail.
    pub async fn fail_url(&self, url: impl Into<String>) {
        self.failing.write().await.insert(url.into());
    }

    /// URLs fetched so far, in order.
    pub async fn fetched(&self) -> Vec<String> {
        self.fetched.read().await.clone()
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        self.fetched.write().await.push(url.to_string());

        if url.is_empty() || self.failing.read().await.contains(url) {
            return Err(StorageError::MediaFetch {
                url: url.to_string(),
                message: "mock fetch failure".to_string(),
            });
        }

        Ok(format!("audio:{}", url).into_bytes())
    }
}
