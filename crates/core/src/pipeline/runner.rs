//! Generation pipeline implementation.
//!
//! Drives one request through the state machine:
//! `Idle -> Submitting -> Polling -> Ingesting -> Idle`.
//! Any failure before ingestion returns to `Idle` with an error. Ingestion
//! itself cannot fail; degraded tracks are reported as warnings.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info};

use crate::generation::{GenerationClient, GenerationRequest, TaskHandle, TaskStatus};
use crate::ingest::{ArtifactIngestor, IngestOutcome, IngestedTrack};
use crate::poller::{CompletionPoller, PollPolicy};
use crate::progress::{ProgressEvent, ProgressHandle};

use super::types::{PipelineError, PipelineState};

/// Request -> tracks pipeline.
///
/// Holds no per-run state: concurrent `run` calls share nothing but the
/// underlying clients, and each owns the task handle it created.
pub struct GenerationPipeline {
    client: Arc<dyn GenerationClient>,
    poller: CompletionPoller,
    ingestor: Arc<ArtifactIngestor>,
    policy: PollPolicy,
    max_concurrent_ingests: usize,
    progress: Option<ProgressHandle>,
}

impl GenerationPipeline {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        poller: CompletionPoller,
        ingestor: Arc<ArtifactIngestor>,
    ) -> Self {
        let max_concurrent_ingests = ingestor.config().max_concurrent_ingests.max(1);
        Self {
            client,
            poller,
            ingestor,
            policy: PollPolicy::default(),
            max_concurrent_ingests,
            progress: None,
        }
    }

    /// Override the default polling policy.
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attach a progress channel.
    pub fn with_progress(mut self, progress: ProgressHandle) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Ingest up to `n` artifacts at a time. Output order is unaffected.
    pub fn with_ingest_concurrency(mut self, n: usize) -> Self {
        self.max_concurrent_ingests = n.max(1);
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            progress.emit(event);
        }
    }

    fn transition(state: &mut PipelineState, next: PipelineState, request: &GenerationRequest) {
        debug!(
            "Pipeline {}: {} -> {}",
            request.request_id,
            state.as_str(),
            next.as_str()
        );
        *state = next;
    }

    fn fail(&self, request: &GenerationRequest, err: PipelineError) -> PipelineError {
        error!("Pipeline {} failed: {}", request.request_id, err);
        self.emit(ProgressEvent::Failed {
            request_id: request.request_id.clone(),
            task_id: err.task().map(|t| t.to_string()),
            error: err.to_string(),
        });
        err
    }

    /// Submit `request`, wait for it, and ingest every artifact.
    pub async fn run(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<IngestedTrack>, PipelineError> {
        let mut state = PipelineState::Idle;

        Self::transition(&mut state, PipelineState::Submitting, request);
        self.emit(ProgressEvent::SubmissionStarted {
            request_id: request.request_id.clone(),
            prompt: request.prompt.clone(),
        });

        let handle = match self.client.submit(request).await {
            Ok(handle) => handle,
            Err(e) => {
                Self::transition(&mut state, PipelineState::Idle, request);
                return Err(self.fail(request, e.into()));
            }
        };

        info!(
            "Request {} submitted as task {}",
            request.request_id, handle
        );
        self.emit(ProgressEvent::Submitted {
            request_id: request.request_id.clone(),
            task_id: handle.to_string(),
        });

        self.poll_and_ingest(&mut state, &handle, request).await
    }

    /// Re-enter polling for a task that timed out earlier.
    pub async fn resume(
        &self,
        handle: &TaskHandle,
        request: &GenerationRequest,
    ) -> Result<Vec<IngestedTrack>, PipelineError> {
        info!("Resuming task {} for request {}", handle, request.request_id);
        let mut state = PipelineState::Idle;
        self.poll_and_ingest(&mut state, handle, request).await
    }

    /// Run and append the new tracks to a caller-owned collection.
    ///
    /// `tracks` is only touched after the run succeeds, so an error or a
    /// dropped future leaves it as it was. Returns the number appended.
    pub async fn run_into(
        &self,
        request: &GenerationRequest,
        tracks: &mut Vec<IngestedTrack>,
    ) -> Result<usize, PipelineError> {
        let new_tracks = self.run(request).await?;
        let added = new_tracks.len();
        tracks.extend(new_tracks);
        Ok(added)
    }

    async fn poll_and_ingest(
        &self,
        state: &mut PipelineState,
        handle: &TaskHandle,
        request: &GenerationRequest,
    ) -> Result<Vec<IngestedTrack>, PipelineError> {
        Self::transition(state, PipelineState::Polling, request);
        self.emit(ProgressEvent::PollingStarted {
            task_id: handle.to_string(),
            max_attempts: self.policy.max_attempts,
            interval_ms: self.policy.interval.as_millis() as u64,
        });

        let status = match self.poller.await_completion(handle, self.policy).await {
            Ok(status) => status,
            Err(source) => {
                Self::transition(state, PipelineState::Idle, request);
                let err = PipelineError::Poll {
                    task: handle.clone(),
                    source,
                };
                return Err(self.fail(request, err));
            }
        };

        let artifacts = match status {
            TaskStatus::Succeeded(artifacts) if !artifacts.is_empty() => artifacts,
            other => {
                Self::transition(state, PipelineState::Idle, request);
                let err = match other {
                    TaskStatus::Failed(reason) => PipelineError::GenerationFailed {
                        task: handle.clone(),
                        reason,
                    },
                    TaskStatus::TimedOut | TaskStatus::Pending => PipelineError::TimedOut {
                        task: handle.clone(),
                        attempts: self.policy.max_attempts,
                    },
                    TaskStatus::Succeeded(_) => PipelineError::NoArtifacts {
                        task: handle.clone(),
                    },
                };
                return Err(self.fail(request, err));
            }
        };

        Self::transition(state, PipelineState::Ingesting, request);
        info!(
            "Task {} produced {} artifact(s), ingesting {} at a time",
            handle,
            artifacts.len(),
            self.max_concurrent_ingests
        );

        // `buffered` yields in submission order regardless of completion order.
        let mut outcomes = stream::iter(artifacts.iter())
            .map(|artifact| self.ingestor.ingest(artifact, request, handle))
            .buffered(self.max_concurrent_ingests);

        let mut tracks = Vec::with_capacity(artifacts.len());
        let mut degraded = 0;
        while let Some(outcome) = outcomes.next().await {
            match &outcome {
                IngestOutcome::Stored(track) => {
                    self.emit(ProgressEvent::TrackIngested {
                        task_id: handle.to_string(),
                        track_id: track.id.clone(),
                        title: track.title.clone(),
                        metadata_address: track
                            .metadata_address
                            .as_ref()
                            .map(|a| a.uri())
                            .unwrap_or_default(),
                    });
                }
                IngestOutcome::Degraded { track, error, .. } => {
                    degraded += 1;
                    debug!(
                        "Track {} of task {} kept without storage: {}",
                        track.id, handle, error
                    );
                    self.emit(ProgressEvent::TrackDegraded {
                        task_id: handle.to_string(),
                        track_id: track.id.clone(),
                        title: track.title.clone(),
                        error: error.to_string(),
                    });
                }
            }
            tracks.push(outcome.into_track());
        }

        Self::transition(state, PipelineState::Idle, request);
        info!(
            "Task {} complete: {} track(s), {} degraded",
            handle,
            tracks.len(),
            degraded
        );
        self.emit(ProgressEvent::Completed {
            task_id: handle.to_string(),
            tracks: tracks.len(),
            degraded,
        });

        Ok(tracks)
    }
}
