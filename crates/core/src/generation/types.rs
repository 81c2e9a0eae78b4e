//! Types shared by generation clients and the completion poller.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameters for a single generation job.
///
/// Built once by the caller and only ever borrowed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    /// Request-scoped identifier (UUID v4), used for log correlation.
    pub request_id: String,
    /// Free-form prompt describing the track.
    pub prompt: String,
    /// Style / genre hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Requested title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Generate without vocals.
    #[serde(default)]
    pub instrumental: bool,
    /// Model identifier (e.g. "V4_5").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Styles to steer away from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_tags: Option<String>,
    /// Target duration in seconds. Advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    /// URL the service should notify on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

impl GenerationRequest {
    /// Create a request for the given prompt with a fresh request id.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            style: None,
            title: None,
            instrumental: false,
            model: None,
            negative_tags: None,
            duration_secs: None,
            callback_url: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn instrumental(mut self, instrumental: bool) -> Self {
        self.instrumental = instrumental;
        self
    }

    /// Custom mode is used whenever the caller pins down style or title.
    pub fn is_custom_mode(&self) -> bool {
        self.style.is_some() || self.title.is_some()
    }
}

/// Opaque identifier of a submitted generation task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self(task_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The service's description of one produced track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawArtifact {
    /// Service-assigned track id.
    pub id: String,
    /// Track title.
    pub title: String,
    /// Duration in fractional seconds.
    pub duration: f64,
    /// Direct download URL of the audio.
    pub audio_url: String,
    /// Streaming URL, available before the final file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_audio_url: Option<String>,
    /// Cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Comma-separated generation tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Model that produced the track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Creation time reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw result of one status query, before classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusReport {
    /// Status string as reported by the service (e.g. "PENDING", "SUCCESS").
    pub status: String,
    /// Service-supplied error text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Produced artifacts in service order. Empty until the task completes.
    #[serde(default)]
    pub artifacts: Vec<RawArtifact>,
}

impl StatusReport {
    pub fn pending() -> Self {
        Self {
            status: "PENDING".to_string(),
            error_message: None,
            artifacts: Vec::new(),
        }
    }

    pub fn succeeded(artifacts: Vec<RawArtifact>) -> Self {
        Self {
            status: "SUCCESS".to_string(),
            error_message: None,
            artifacts,
        }
    }

    pub fn failed(status: impl Into<String>, error_message: Option<String>) -> Self {
        Self {
            status: status.into(),
            error_message,
            artifacts: Vec::new(),
        }
    }
}

/// Classified task status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Succeeded(Vec<RawArtifact>),
    Failed(String),
    TimedOut,
}

impl TaskStatus {
    /// Whether no further transition can occur from this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Succeeded(_) => "succeeded",
            TaskStatus::Failed(_) => "failed",
            TaskStatus::TimedOut => "timed_out",
        }
    }
}
