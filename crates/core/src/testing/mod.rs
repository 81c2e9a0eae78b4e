//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every external service trait,
//! allowing the whole pipeline to be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use trackforge_core::testing::{MockContentStore, MockGenerationClient, RecordingSleeper};
//!
//! let client = MockGenerationClient::new();
//! let store = MockContentStore::new();
//! let sleeper = RecordingSleeper::new();
//!
//! client.script_next_task(vec![StatusReport::pending(), StatusReport::succeeded(artifacts)]).await;
//! store.fail_uploads_containing("a2").await;
//! ```

mod mock_content_store;
mod mock_generation_client;
mod mock_media_source;

pub use mock_content_store::{MockContentStore, RecordedUpload};
pub use mock_generation_client::MockGenerationClient;
pub use mock_media_source::MockMediaSource;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::poller::Sleeper;

/// Sleeper that records requested durations and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested sleep, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Total simulated time.
    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::generation::RawArtifact;

    /// Create a raw artifact with reasonable defaults and no tags.
    pub fn raw_artifact(id: &str, title: &str, duration: f64) -> RawArtifact {
        RawArtifact {
            id: id.to_string(),
            title: title.to_string(),
            duration,
            audio_url: format!("https://cdn.test/{}.mp3", id),
            stream_audio_url: Some(format!("https://cdn.test/stream/{}", id)),
            image_url: Some(format!("https://cdn.test/{}.jpg", id)),
            tags: None,
            model_name: Some("chirp-v4".to_string()),
            created_at: None,
        }
    }

    /// Create a raw artifact carrying a tag string.
    pub fn tagged_artifact(id: &str, title: &str, tags: &str) -> RawArtifact {
        RawArtifact {
            tags: Some(tags.to_string()),
            ..raw_artifact(id, title, 120.0)
        }
    }

    /// `count` untagged artifacts named a1, a2, ...
    pub fn artifacts(count: usize) -> Vec<RawArtifact> {
        (1..=count)
            .map(|i| raw_artifact(&format!("a{}", i), &format!("Track {}", i), 60.0 + i as f64))
            .collect()
    }
}
