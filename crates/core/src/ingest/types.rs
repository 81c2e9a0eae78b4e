//! Types produced by artifact ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generation::TaskHandle;
use crate::storage::{ContentAddress, StorageError};

/// One `trait_type` / `value` pair of a metadata record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: String,
}

impl MetadataAttribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// Normalized, NFT-style metadata for one generated track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataRecord {
    pub name: String,
    /// The prompt the track was generated from.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    /// Duration in whole seconds.
    pub duration: u64,
    /// Genre, Duration, Model, Created (in this order).
    pub attributes: Vec<MetadataAttribute>,
    /// Audio reference: `ipfs://` once pinned, the direct URL otherwise.
    #[serde(rename = "animation_url")]
    pub audio_url: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub creator: String,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

/// A generated track after ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestedTrack {
    pub id: String,
    pub title: String,
    pub creator: String,
    /// Duration in whole seconds.
    pub duration_secs: u64,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Address of the pinned metadata document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_address: Option<ContentAddress>,
    /// Address of the pinned audio file, when media pinning is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_address: Option<ContentAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataRecord>,
    pub task: TaskHandle,
    pub created_at: DateTime<Utc>,
}

impl IngestedTrack {
    /// Whether the storage step completed for this track.
    pub fn is_stored(&self) -> bool {
        self.metadata_address.is_some()
    }
}

/// Result of ingesting one artifact.
///
/// Both variants carry a usable track; `Degraded` additionally keeps the
/// in-memory record and the storage error that prevented pinning.
#[derive(Debug)]
pub enum IngestOutcome {
    Stored(IngestedTrack),
    Degraded {
        track: IngestedTrack,
        record: MetadataRecord,
        error: StorageError,
    },
}

impl IngestOutcome {
    pub fn track(&self) -> &IngestedTrack {
        match self {
            IngestOutcome::Stored(track) => track,
            IngestOutcome::Degraded { track, .. } => track,
        }
    }

    pub fn into_track(self) -> IngestedTrack {
        match self {
            IngestOutcome::Stored(track) => track,
            IngestOutcome::Degraded { track, .. } => track,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, IngestOutcome::Degraded { .. })
    }
}
