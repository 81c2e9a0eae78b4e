//! Types for the generation pipeline.

use thiserror::Error;

use crate::generation::{GenerationError, TaskHandle};

/// Errors that abort a pipeline run.
///
/// Storage failures are absent on purpose: they degrade single tracks and
/// never reach this level.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transport or protocol failure talking to the generation service.
    #[error("generation service error: {0}")]
    Service(#[from] GenerationError),

    /// Status query failed after submission. The task may still finish.
    #[error("polling task {task} failed: {source}")]
    Poll {
        task: TaskHandle,
        #[source]
        source: GenerationError,
    },

    /// The service reported the task as failed or rejected its content.
    #[error("generation failed for task {task}: {reason}")]
    GenerationFailed { task: TaskHandle, reason: String },

    /// Attempt bound exhausted. The task may still finish; resume with `task`.
    #[error("task {task} still pending after {attempts} attempt(s)")]
    TimedOut { task: TaskHandle, attempts: u32 },

    /// The service reported success without producing anything.
    #[error("task {task} succeeded without artifacts")]
    NoArtifacts { task: TaskHandle },
}

impl PipelineError {
    /// Task the error belongs to, if one was created.
    pub fn task(&self) -> Option<&TaskHandle> {
        match self {
            PipelineError::Service(_) => None,
            PipelineError::Poll { task, .. }
            | PipelineError::GenerationFailed { task, .. }
            | PipelineError::TimedOut { task, .. }
            | PipelineError::NoArtifacts { task } => Some(task),
        }
    }

    /// Whether polling the same task again could still succeed.
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            PipelineError::TimedOut { .. } | PipelineError::Poll { .. }
        )
    }
}

/// Where a pipeline run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Submitting,
    Polling,
    Ingesting,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Submitting => "submitting",
            PipelineState::Polling => "polling",
            PipelineState::Ingesting => "ingesting",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::GenerationFailed {
            task: TaskHandle::new("task-9"),
            reason: "prompt rejected".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "generation failed for task task-9: prompt rejected"
        );

        let err = PipelineError::TimedOut {
            task: TaskHandle::new("task-9"),
            attempts: 30,
        };
        assert_eq!(err.to_string(), "task task-9 still pending after 30 attempt(s)");
        assert!(err.is_resumable());
        assert_eq!(err.task().map(TaskHandle::as_str), Some("task-9"));
    }

    #[test]
    fn test_service_error_has_no_task() {
        let err = PipelineError::from(GenerationError::NotConfigured("key".to_string()));
        assert!(err.task().is_none());
        assert!(!err.is_resumable());
    }

    #[test]
    fn test_poll_error_keeps_task() {
        let err = PipelineError::Poll {
            task: TaskHandle::new("task-4"),
            source: GenerationError::ParseError("bad body".to_string()),
        };
        assert_eq!(err.task().map(TaskHandle::as_str), Some("task-4"));
        assert!(err.is_resumable());
        assert!(std::error::Error::source(&err).is_some());
    }
}
