//! Artifact ingestor implementation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::metadata::{build_record, display_title, whole_seconds, RecordContext};
use super::types::{IngestOutcome, IngestedTrack, MetadataRecord};
use crate::config::IngestConfig;
use crate::generation::{GenerationRequest, RawArtifact, TaskHandle};
use crate::storage::{ContentAddress, ContentStore, MediaSource, StorageError};

const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Addresses produced by a successful storage step.
struct Pinned {
    metadata: ContentAddress,
    media: Option<ContentAddress>,
    record: MetadataRecord,
}

/// Pins generated artifacts and normalizes them into tracks.
pub struct ArtifactIngestor {
    store: Arc<dyn ContentStore>,
    media: Arc<dyn MediaSource>,
    config: IngestConfig,
}

impl ArtifactIngestor {
    pub fn new(
        store: Arc<dyn ContentStore>,
        media: Arc<dyn MediaSource>,
        config: IngestConfig,
    ) -> Self {
        Self {
            store,
            media,
            config,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one artifact. Storage failures are logged and turned into a
    /// degraded outcome; they never propagate.
    pub async fn ingest(
        &self,
        artifact: &RawArtifact,
        request: &GenerationRequest,
        task: &TaskHandle,
    ) -> IngestOutcome {
        let generated_at = Utc::now();
        let record = build_record(
            artifact,
            request,
            &RecordContext {
                creator: &self.config.creator_label,
                external_url: self.config.external_url.as_deref(),
                generated_at,
            },
        );

        let mut track = IngestedTrack {
            id: artifact.id.clone(),
            title: display_title(artifact, request),
            creator: self.config.creator_label.clone(),
            duration_secs: whole_seconds(artifact.duration),
            audio_url: artifact.audio_url.clone(),
            stream_audio_url: artifact.stream_audio_url.clone(),
            image_url: artifact.image_url.clone(),
            genres: record.genres.clone(),
            metadata_address: None,
            media_address: None,
            metadata: None,
            task: task.clone(),
            created_at: artifact.created_at.unwrap_or(generated_at),
        };

        match self.pin(artifact, record.clone()).await {
            Ok(pinned) => {
                info!(
                    "Ingested track {} (metadata {})",
                    artifact.id, pinned.metadata
                );
                track.metadata_address = Some(pinned.metadata);
                track.media_address = pinned.media;
                track.metadata = Some(pinned.record);
                IngestOutcome::Stored(track)
            }
            Err(error) => {
                warn!(
                    "Storage failed for track {}, keeping direct locators: {}",
                    artifact.id, error
                );
                IngestOutcome::Degraded {
                    track,
                    record,
                    error,
                }
            }
        }
    }

    async fn pin(
        &self,
        artifact: &RawArtifact,
        mut record: MetadataRecord,
    ) -> Result<Pinned, StorageError> {
        let media = if self.config.pin_media {
            let bytes = self.media.fetch(&artifact.audio_url).await?;
            let address = self
                .store
                .upload_bytes(&format!("{}.mp3", artifact.id), bytes, AUDIO_CONTENT_TYPE)
                .await?;
            debug!("Pinned audio for {} at {}", artifact.id, address);
            record.audio_url = address.uri();
            Some(address)
        } else {
            None
        };

        let document = serde_json::to_value(&record)?;
        let metadata = self
            .store
            .upload_json(&format!("{}-metadata.json", artifact.id), &document)
            .await?;

        Ok(Pinned {
            metadata,
            media,
            record,
        })
    }
}
