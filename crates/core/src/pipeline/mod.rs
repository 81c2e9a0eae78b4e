//! Generation-to-ingestion pipeline.
//!
//! Composes the generation client, the completion poller and the artifact
//! ingestor into a single `run(request) -> tracks` operation:
//! - **Submission / polling**: sequential, any failure aborts the run
//! - **Ingestion**: per artifact, optionally concurrent, failures degrade
//!   the affected track only

mod runner;
mod session;
mod types;

pub use runner::GenerationPipeline;
pub use session::GenerationSession;
pub use types::{PipelineError, PipelineState};
