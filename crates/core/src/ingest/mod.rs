//! Artifact ingestion.
//!
//! Turns each generated artifact into an [`IngestedTrack`]: builds the
//! metadata record, pins media and metadata to content-addressed storage, and
//! isolates storage failures to the artifact they belong to.

mod ingestor;
mod metadata;
mod types;

pub use ingestor::ArtifactIngestor;
pub use metadata::{
    build_record, format_duration, parse_tags, whole_seconds, RecordContext, TAG_SEPARATOR,
};
pub use types::*;
