pub mod config;
pub mod generation;
pub mod ingest;
pub mod pipeline;
pub mod poller;
pub mod progress;
pub mod storage;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, GenerationConfig,
    IngestConfig, PollerConfig, SanitizedConfig, StorageConfig,
};
pub use generation::{
    GenerationClient, GenerationError, GenerationRequest, HttpGenerationClient, RawArtifact,
    StatusReport, TaskHandle, TaskStatus,
};
pub use ingest::{
    ArtifactIngestor, IngestOutcome, IngestedTrack, MetadataAttribute, MetadataRecord,
};
pub use pipeline::{GenerationPipeline, GenerationSession, PipelineError, PipelineState};
pub use poller::{classify_status, CompletionPoller, PollPolicy, Sleeper, TokioSleeper};
pub use progress::{
    progress_channel, ProgressEnvelope, ProgressEvent, ProgressHandle, ProgressLevel,
};
pub use storage::{
    ContentAddress, ContentStore, HttpMediaSource, MediaSource, PinataStore, StorageError,
};
