use serde::{Deserialize, Serialize};

/// Severity of a progress event, for whoever renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressLevel {
    Info,
    Warning,
    Success,
    Error,
}

/// Progress event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    SubmissionStarted {
        request_id: String,
        prompt: String,
    },
    Submitted {
        request_id: String,
        task_id: String,
    },
    PollingStarted {
        task_id: String,
        max_attempts: u32,
        interval_ms: u64,
    },
    TrackIngested {
        task_id: String,
        track_id: String,
        title: String,
        metadata_address: String,
    },
    /// Track kept without storage fields.
    TrackDegraded {
        task_id: String,
        track_id: String,
        title: String,
        error: String,
    },
    Completed {
        task_id: String,
        tracks: usize,
        degraded: usize,
    },
    Failed {
        request_id: String,
        task_id: Option<String>,
        error: String,
    },
}

impl ProgressEvent {
    pub fn level(&self) -> ProgressLevel {
        match self {
            ProgressEvent::SubmissionStarted { .. }
            | ProgressEvent::Submitted { .. }
            | ProgressEvent::PollingStarted { .. }
            | ProgressEvent::TrackIngested { .. } => ProgressLevel::Info,
            ProgressEvent::TrackDegraded { .. } => ProgressLevel::Warning,
            ProgressEvent::Completed { .. } => ProgressLevel::Success,
            ProgressEvent::Failed { .. } => ProgressLevel::Error,
        }
    }

    /// Human-readable one-line description.
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::SubmissionStarted { prompt, .. } => {
                format!("Submitting generation request: \"{}\"", prompt)
            }
            ProgressEvent::Submitted { task_id, .. } => {
                format!("Generation task {} accepted", task_id)
            }
            ProgressEvent::PollingStarted {
                task_id,
                max_attempts,
                interval_ms,
            } => format!(
                "Waiting for task {} (up to {} checks, every {} ms)",
                task_id, max_attempts, interval_ms
            ),
            ProgressEvent::TrackIngested {
                title,
                metadata_address,
                ..
            } => format!("Stored \"{}\" at {}", title, metadata_address),
            ProgressEvent::TrackDegraded { title, error, .. } => format!(
                "\"{}\" was generated but could not be stored: {}",
                title, error
            ),
            ProgressEvent::Completed {
                tracks, degraded, ..
            } => {
                if *degraded == 0 {
                    format!("Generated {} track(s)", tracks)
                } else {
                    format!(
                        "Generated {} track(s), {} without storage",
                        tracks, degraded
                    )
                }
            }
            ProgressEvent::Failed { error, .. } => format!("Generation failed: {}", error),
        }
    }
}
