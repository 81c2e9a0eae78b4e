//! Completion polling for submitted generation tasks.
//!
//! The poller owns retry policy: one status query per attempt, a suspension
//! of `interval` between attempts, and a hard attempt bound after which it
//! reports `TimedOut` instead of an error. The caller may re-poll the same
//! handle later.

mod sleeper;

pub use sleeper::{Sleeper, TokioSleeper};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::generation::{GenerationClient, GenerationError, StatusReport, TaskHandle, TaskStatus};

/// Status string reported once every track is ready.
pub const SUCCESS_MARKER: &str = "SUCCESS";

/// Substring shared by every failure status ("CREATE_TASK_FAILED", ...).
pub const FAILURE_MARKER: &str = "FAILED";

/// Status reported when the prompt was rejected by content moderation.
pub const REJECTED_CONTENT_MARKER: &str = "SENSITIVE_WORD_ERROR";

const GENERIC_FAILURE: &str = "generation failed";

/// How long and how often to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Suspension between attempts.
    pub interval: Duration,
    /// Maximum number of status queries.
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

impl Default for PollPolicy {
    /// 30 attempts, 10 seconds apart (about five minutes).
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }
}

/// Classify a raw status report.
///
/// Intermediate statuses such as "TEXT_SUCCESS" or "FIRST_SUCCESS" only
/// partially match the success marker and stay pending.
pub fn classify_status(report: StatusReport) -> TaskStatus {
    if report.status == SUCCESS_MARKER {
        return TaskStatus::Succeeded(report.artifacts);
    }

    if report.status.contains(FAILURE_MARKER) || report.status == REJECTED_CONTENT_MARKER {
        let reason = report
            .error_message
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        return TaskStatus::Failed(reason);
    }

    TaskStatus::Pending
}

/// Polls a generation client until a task reaches a terminal status.
#[derive(Clone)]
pub struct CompletionPoller {
    client: Arc<dyn GenerationClient>,
    sleeper: Arc<dyn Sleeper>,
}

impl CompletionPoller {
    /// Create a poller that suspends on the tokio timer.
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self::with_sleeper(client, Arc::new(TokioSleeper))
    }

    /// Create a poller with a custom sleeper (tests inject a virtual clock).
    pub fn with_sleeper(client: Arc<dyn GenerationClient>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { client, sleeper }
    }

    /// Wait for `handle` to finish.
    ///
    /// Returns `TimedOut` when the attempt bound runs out while the task is
    /// still pending. A transport or protocol failure on any attempt aborts
    /// immediately.
    pub async fn await_completion(
        &self,
        handle: &TaskHandle,
        policy: PollPolicy,
    ) -> Result<TaskStatus, GenerationError> {
        for attempt in 1..=policy.max_attempts {
            let report = self.client.query_status(handle).await?;
            let raw_status = report.status.clone();

            match classify_status(report) {
                TaskStatus::Pending => {
                    debug!(
                        "Task {} pending ({}), attempt {}/{}",
                        handle, raw_status, attempt, policy.max_attempts
                    );
                }
                status => {
                    info!(
                        "Task {} reached {} after {} attempt(s)",
                        handle,
                        status.as_str(),
                        attempt
                    );
                    return Ok(status);
                }
            }

            if attempt < policy.max_attempts {
                self.sleeper.sleep(policy.interval).await;
            }
        }

        warn!(
            "Task {} still pending after {} attempt(s), giving up",
            handle, policy.max_attempts
        );
        Ok(TaskStatus::TimedOut)
    }
}
