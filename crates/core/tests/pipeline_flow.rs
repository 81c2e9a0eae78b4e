//! Pipeline integration tests.
//!
//! These tests drive the full request -> tracks flow with mock services:
//! - Ordering and count of returned tracks
//! - Per-artifact storage failure isolation
//! - Failed, timed-out and empty completions
//! - Polling cadence through the recording sleeper
//! - Progress events and caller-owned sessions

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

use trackforge_core::{
    progress_channel,
    testing::{
        fixtures, MockContentStore, MockGenerationClient, MockMediaSource, RecordingSleeper,
    },
    ArtifactIngestor, CompletionPoller, GenerationClient, GenerationError, GenerationPipeline,
    GenerationRequest, GenerationSession, IngestConfig, IngestedTrack, PipelineError, PollPolicy,
    ProgressEnvelope, ProgressEvent, ProgressLevel, RawArtifact, StatusReport, TaskHandle,
    TaskStatus,
};

/// Test helper wiring a pipeline to mocks.
struct TestHarness {
    client: MockGenerationClient,
    store: MockContentStore,
    media: MockMediaSource,
    sleeper: RecordingSleeper,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            client: MockGenerationClient::new(),
            store: MockContentStore::new(),
            media: MockMediaSource::new(),
            sleeper: RecordingSleeper::new(),
        }
    }

    fn poller(&self) -> CompletionPoller {
        CompletionPoller::with_sleeper(
            Arc::new(self.client.clone()),
            Arc::new(self.sleeper.clone()),
        )
    }

    fn pipeline_with(&self, config: IngestConfig, policy: PollPolicy) -> GenerationPipeline {
        let ingestor = ArtifactIngestor::new(
            Arc::new(self.store.clone()),
            Arc::new(self.media.clone()),
            config,
        );
        GenerationPipeline::new(Arc::new(self.client.clone()), self.poller(), Arc::new(ingestor))
            .with_policy(policy)
    }

    fn pipeline(&self) -> GenerationPipeline {
        self.pipeline_with(IngestConfig::default(), fast_policy(5))
    }

    async fn submit(&self) -> TaskHandle {
        self.client
            .submit(&GenerationRequest::new("poll me"))
            .await
            .expect("mock submission failed")
    }

    async fn script_success(&self, artifacts: Vec<RawArtifact>) {
        self.client
            .script_next_task(vec![StatusReport::succeeded(artifacts)])
            .await;
    }
}

fn fast_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy::new(max_attempts, Duration::from_millis(10))
}

fn drain(rx: &mut mpsc::Receiver<ProgressEnvelope>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope.event);
    }
    events
}

fn ids(tracks: &[IngestedTrack]) -> Vec<String> {
    tracks.iter().map(|t| t.id.clone()).collect()
}

// =============================================================================
// Success path
// =============================================================================

#[tokio::test]
async fn test_returns_one_track_per_artifact_in_order() {
    let harness = TestHarness::new();
    harness.script_success(fixtures::artifacts(5)).await;

    let tracks = assert_ok!(harness.pipeline().run(&GenerationRequest::new("five")).await);

    assert_eq!(ids(&tracks), vec!["a1", "a2", "a3", "a4", "a5"]);
    assert!(tracks.iter().all(|t| t.is_stored()));
    assert!(tracks.iter().all(|t| t.task.as_str() == "task-1"));
}

#[tokio::test]
async fn test_concurrent_ingestion_preserves_order() {
    let harness = TestHarness::new();
    harness.script_success(fixtures::artifacts(6)).await;
    // a1 finishes after a2 and a3 even though it started first.
    harness
        .store
        .delay_uploads_containing("a1", Duration::from_millis(50))
        .await;

    let pipeline = harness
        .pipeline_with(IngestConfig::default(), fast_policy(5))
        .with_ingest_concurrency(3);
    let tracks = pipeline.run(&GenerationRequest::new("six")).await.unwrap();

    assert_eq!(ids(&tracks), vec!["a1", "a2", "a3", "a4", "a5", "a6"]);

    // audio + metadata per artifact, recorded in completion order
    let completed: Vec<String> = harness
        .store
        .uploads()
        .await
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(completed.len(), 12);
    let position = |name: &str| completed.iter().position(|n| n == name).unwrap();
    assert!(position("a2-metadata.json") < position("a1-metadata.json"));
    assert!(position("a3-metadata.json") < position("a1-metadata.json"));
}

#[tokio::test]
async fn test_lofi_scenario() {
    let harness = TestHarness::new();
    harness
        .script_success(vec![fixtures::raw_artifact("t1", "Chill", 31.4)])
        .await;

    let request = GenerationRequest::new("lofi beat").with_duration(30);
    let tracks = harness.pipeline().run(&request).await.unwrap();

    assert_eq!(tracks.len(), 1);
    let track = &tracks[0];
    assert_eq!(track.id, "t1");
    assert_eq!(track.title, "Chill");
    assert_eq!(track.duration_secs, 31);
    assert!(track.genres.is_empty());
    assert_eq!(track.creator, "Trackforge AI");

    let record = track.metadata.as_ref().unwrap();
    assert_eq!(record.description, "lofi beat");
    assert_eq!(record.duration, 31);
}

#[tokio::test]
async fn test_tags_become_genres() {
    let harness = TestHarness::new();
    harness
        .script_success(vec![fixtures::tagged_artifact("t1", "Night", "synthwave, retro")])
        .await;

    let tracks = harness
        .pipeline()
        .run(&GenerationRequest::new("night drive"))
        .await
        .unwrap();
    assert_eq!(tracks[0].genres, vec!["synthwave", "retro"]);
}

#[tokio::test]
async fn test_polls_until_success() {
    let harness = TestHarness::new();
    harness
        .client
        .script_next_task(vec![
            StatusReport::pending(),
            StatusReport::pending(),
            StatusReport::succeeded(fixtures::artifacts(2)),
        ])
        .await;

    let tracks = harness
        .pipeline()
        .run(&GenerationRequest::new("x"))
        .await
        .unwrap();

    assert_eq!(tracks.len(), 2);
    assert_eq!(harness.client.query_count().await, 3);
    assert_eq!(harness.sleeper.total(), Duration::from_millis(20));
}

// =============================================================================
// Poller
// =============================================================================

#[tokio::test]
async fn test_poller_pending_pending_succeeded() {
    let harness = TestHarness::new();
    harness
        .client
        .script_next_task(vec![
            StatusReport::pending(),
            StatusReport::pending(),
            StatusReport::succeeded(fixtures::artifacts(2)),
        ])
        .await;

    let handle = harness.submit().await;
    let status = harness
        .poller()
        .await_completion(&handle, fast_policy(5))
        .await
        .unwrap();

    match status {
        TaskStatus::Succeeded(artifacts) => assert_eq!(artifacts.len(), 2),
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(harness.client.query_count().await, 3);
    assert_eq!(
        harness.sleeper.sleeps(),
        vec![Duration::from_millis(10), Duration::from_millis(10)]
    );
}

#[tokio::test]
async fn test_poller_times_out_without_trailing_sleep() {
    let harness = TestHarness::new();
    let handle = harness.submit().await;

    let status = harness
        .poller()
        .await_completion(&handle, fast_policy(4))
        .await
        .unwrap();

    assert_eq!(status, TaskStatus::TimedOut);
    assert_eq!(harness.client.query_count().await, 4);
    assert_eq!(harness.sleeper.sleeps().len(), 3);
}

#[tokio::test]
async fn test_poller_zero_attempts_times_out_immediately() {
    let harness = TestHarness::new();
    let handle = harness.submit().await;

    let status = harness
        .poller()
        .await_completion(&handle, fast_policy(0))
        .await
        .unwrap();

    assert_eq!(status, TaskStatus::TimedOut);
    assert_eq!(harness.client.query_count().await, 0);
}

// =============================================================================
// Storage failure isolation
// =============================================================================

#[tokio::test]
async fn test_storage_failure_for_one_artifact_only() {
    let harness = TestHarness::new();
    harness.script_success(fixtures::artifacts(3)).await;
    harness.store.fail_uploads_containing("a2").await;

    let (progress, mut rx) = progress_channel(64);
    let tracks = harness
        .pipeline()
        .with_progress(progress)
        .run(&GenerationRequest::new("x"))
        .await
        .unwrap();

    assert_eq!(ids(&tracks), vec!["a1", "a2", "a3"]);

    assert!(tracks[0].metadata_address.is_some());
    assert!(tracks[2].metadata_address.is_some());

    let degraded = &tracks[1];
    assert!(degraded.metadata_address.is_none());
    assert!(degraded.media_address.is_none());
    assert!(degraded.metadata.is_none());
    assert_eq!(degraded.audio_url, "https://cdn.test/a2.mp3");
    assert_eq!(degraded.duration_secs, 62);

    let events = drain(&mut rx);
    let warnings: Vec<_> = events
        .iter()
        .filter(|e| e.level() == ProgressLevel::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(
        warnings[0],
        ProgressEvent::TrackDegraded { track_id, .. } if track_id == "a2"
    ));
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Completed {
            tracks: 3,
            degraded: 1,
            ..
        })
    ));
}

#[tokio::test]
async fn test_media_fetch_failure_degrades_track() {
    let harness = TestHarness::new();
    harness.script_success(fixtures::artifacts(2)).await;
    harness.media.fail_url("https://cdn.test/a1.mp3").await;

    let tracks = harness
        .pipeline()
        .run(&GenerationRequest::new("x"))
        .await
        .unwrap();

    assert!(!tracks[0].is_stored());
    assert!(tracks[1].is_stored());
}

#[tokio::test]
async fn test_total_storage_outage_still_returns_every_track() {
    let harness = TestHarness::new();
    harness.script_success(fixtures::artifacts(3)).await;
    harness.store.fail_uploads_containing(".").await;

    let tracks = harness
        .pipeline()
        .run(&GenerationRequest::new("x"))
        .await
        .unwrap();

    assert_eq!(tracks.len(), 3);
    assert!(tracks.iter().all(|t| !t.is_stored()));
    assert_eq!(harness.store.upload_count().await, 0);
}

// =============================================================================
// Fatal outcomes
// =============================================================================

#[tokio::test]
async fn test_failure_marker_fails_without_partial_results() {
    let harness = TestHarness::new();
    harness
        .client
        .script_next_task(vec![
            StatusReport::pending(),
            StatusReport::failed("GENERATE_AUDIO_FAILED", Some("model crashed".to_string())),
        ])
        .await;

    let (progress, mut rx) = progress_channel(64);
    let result = harness
        .pipeline()
        .with_progress(progress)
        .run(&GenerationRequest::new("x"))
        .await;

    match assert_err!(result) {
        PipelineError::GenerationFailed { task, reason } => {
            assert_eq!(task.as_str(), "task-1");
            assert_eq!(reason, "model crashed");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(harness.store.upload_count().await, 0);

    let events = drain(&mut rx);
    let errors: Vec<_> = events
        .iter()
        .filter(|e| e.level() == ProgressLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_rejected_content_fails() {
    let harness = TestHarness::new();
    harness
        .client
        .script_next_task(vec![StatusReport::failed("SENSITIVE_WORD_ERROR", None)])
        .await;

    let err = harness
        .pipeline()
        .run(&GenerationRequest::new("x"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::GenerationFailed { ref reason, .. } if reason == "generation failed"
    ));
}

#[tokio::test]
async fn test_timeout_skips_ingestion() {
    let harness = TestHarness::new();

    let err = harness
        .pipeline_with(IngestConfig::default(), fast_policy(3))
        .run(&GenerationRequest::new("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::TimedOut { attempts: 3, .. }));
    assert!(err.is_resumable());
    assert_eq!(harness.client.query_count().await, 3);
    assert_eq!(harness.store.upload_count().await, 0);
    assert!(harness.media.fetched().await.is_empty());
}

#[tokio::test]
async fn test_resume_after_timeout_uses_same_handle() {
    let harness = TestHarness::new();
    let pipeline = harness.pipeline_with(IngestConfig::default(), fast_policy(2));
    let request = GenerationRequest::new("slow");

    let err = pipeline.run(&request).await.unwrap_err();
    let handle = err.task().cloned().unwrap();

    harness
        .client
        .script_task(&handle, vec![StatusReport::succeeded(fixtures::artifacts(2))])
        .await;

    let tracks = pipeline.resume(&handle, &request).await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert!(tracks.iter().all(|t| t.task == handle));
    assert_eq!(harness.client.submissions().await.len(), 1);
}

#[tokio::test]
async fn test_success_without_artifacts_is_contract_violation() {
    let harness = TestHarness::new();
    harness.script_success(vec![]).await;

    let err = harness
        .pipeline()
        .run(&GenerationRequest::new("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoArtifacts { .. }));
}

#[tokio::test]
async fn test_submit_failure_is_service_error() {
    let harness = TestHarness::new();
    harness
        .client
        .set_submit_error(GenerationError::ApiError {
            status: 500,
            message: "boom".to_string(),
        })
        .await;

    let err = harness
        .pipeline()
        .run(&GenerationRequest::new("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Service(_)));
    assert_eq!(harness.client.query_count().await, 0);
}

#[tokio::test]
async fn test_transport_failure_mid_poll_aborts() {
    let harness = TestHarness::new();
    harness
        .client
        .script_next_task(vec![
            StatusReport::pending(),
            StatusReport::pending(),
            StatusReport::succeeded(fixtures::artifacts(1)),
        ])
        .await;
    harness
        .client
        .fail_query(2, GenerationError::ParseError("truncated body".to_string()))
        .await;

    let pipeline = harness.pipeline();
    let request = GenerationRequest::new("x");
    let err = pipeline.run(&request).await.unwrap_err();

    assert!(matches!(
        &err,
        PipelineError::Poll {
            source: GenerationError::ParseError(_),
            ..
        }
    ));
    assert_eq!(harness.client.query_count().await, 2);
    assert_eq!(harness.sleeper.sleeps().len(), 1);

    // The handle survives the failure and the task can still be collected.
    let task = err.task().cloned().unwrap();
    assert_eq!(task.as_str(), "task-1");
    assert!(err.is_resumable());

    let tracks = assert_ok!(pipeline.resume(&task, &request).await);
    assert_eq!(ids(&tracks), vec!["a1"]);
}

// =============================================================================
// Independence and sessions
// =============================================================================

#[tokio::test]
async fn test_identical_requests_are_not_deduplicated() {
    let harness = TestHarness::new();
    harness.script_success(fixtures::artifacts(1)).await;
    harness.script_success(fixtures::artifacts(1)).await;
    let pipeline = harness.pipeline();

    let request = GenerationRequest::new("same prompt");
    let first = pipeline.run(&request).await.unwrap();
    let second = pipeline.run(&request).await.unwrap();

    assert_eq!(first[0].task.as_str(), "task-1");
    assert_eq!(second[0].task.as_str(), "task-2");
    assert_eq!(harness.client.submissions().await.len(), 2);
}

#[tokio::test]
async fn test_progress_event_sequence() {
    let harness = TestHarness::new();
    harness.script_success(fixtures::artifacts(2)).await;

    let (progress, mut rx) = progress_channel(64);
    harness
        .pipeline()
        .with_progress(progress)
        .run(&GenerationRequest::new("x"))
        .await
        .unwrap();

    let kinds: Vec<&'static str> = drain(&mut rx)
        .iter()
        .map(|e| match e {
            ProgressEvent::SubmissionStarted { .. } => "submission_started",
            ProgressEvent::Submitted { .. } => "submitted",
            ProgressEvent::PollingStarted { .. } => "polling_started",
            ProgressEvent::TrackIngested { .. } => "track_ingested",
            ProgressEvent::TrackDegraded { .. } => "track_degraded",
            ProgressEvent::Completed { .. } => "completed",
            ProgressEvent::Failed { .. } => "failed",
        })
        .collect();

    assert_eq!(
        kinds,
        vec![
            "submission_started",
            "submitted",
            "polling_started",
            "track_ingested",
            "track_ingested",
            "completed",
        ]
    );
}

#[tokio::test]
async fn test_sessions_own_their_tracks() {
    let harness = TestHarness::new();
    harness.script_success(fixtures::artifacts(2)).await;
    harness.script_success(fixtures::artifacts(1)).await;
    let pipeline = harness.pipeline_with(IngestConfig::default(), fast_policy(2));

    let mut first = GenerationSession::new();
    let mut second = GenerationSession::new();

    assert_eq!(first.generate(&pipeline, &GenerationRequest::new("a")).await.unwrap(), 2);
    assert_eq!(second.generate(&pipeline, &GenerationRequest::new("b")).await.unwrap(), 1);

    // Third task is unscripted and times out; the session keeps its tracks.
    let err = first
        .generate(&pipeline, &GenerationRequest::new("c"))
        .await
        .unwrap_err();
    assert!(err.is_resumable());

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);
    assert_eq!(second.tracks()[0].task.as_str(), "task-2");
}

#[tokio::test]
async fn test_cancelled_generate_keeps_session_tracks() {
    let harness = TestHarness::new();
    harness.script_success(fixtures::artifacts(2)).await;

    // Real clock so the second run is still polling when it gets dropped.
    let ingestor = ArtifactIngestor::new(
        Arc::new(harness.store.clone()),
        Arc::new(harness.media.clone()),
        IngestConfig::default(),
    );
    let client = Arc::new(harness.client.clone());
    let pipeline = GenerationPipeline::new(
        client.clone(),
        CompletionPoller::new(client),
        Arc::new(ingestor),
    )
    .with_policy(PollPolicy::new(100, Duration::from_millis(20)));

    let mut session = GenerationSession::new();
    assert_eq!(
        session
            .generate(&pipeline, &GenerationRequest::new("first"))
            .await
            .unwrap(),
        2
    );

    // Second task is unscripted and stays pending.
    let cancelled = tokio::time::timeout(
        Duration::from_millis(120),
        session.generate(&pipeline, &GenerationRequest::new("second")),
    )
    .await;
    assert!(cancelled.is_err());
    assert!(harness.client.query_count().await > 1);

    assert_eq!(session.len(), 2);
    assert_eq!(ids(session.tracks()), vec!["a1", "a2"]);
}

#[tokio::test]
async fn test_run_into_appends_only_on_success() {
    let harness = TestHarness::new();
    harness.script_success(fixtures::artifacts(2)).await;
    harness
        .client
        .script_next_task(vec![StatusReport::failed("CREATE_TASK_FAILED", None)])
        .await;
    let pipeline = harness.pipeline();

    let mut tracks = Vec::new();
    let added = assert_ok!(
        pipeline
            .run_into(&GenerationRequest::new("ok"), &mut tracks)
            .await
    );
    assert_eq!(added, 2);

    assert_err!(
        pipeline
            .run_into(&GenerationRequest::new("bad"), &mut tracks)
            .await
    );
    assert_eq!(ids(&tracks), vec!["a1", "a2"]);
}
