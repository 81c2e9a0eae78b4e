use crate::generation::GenerationRequest;
use crate::ingest::IngestedTrack;

use super::runner::GenerationPipeline;
use super::types::PipelineError;

/// In-memory list of tracks generated during one session.
///
/// Owned by the caller; two sessions never share a collection even when
/// they drive the same pipeline.
#[derive(Debug, Default, Clone)]
pub struct GenerationSession {
    tracks: Vec<IngestedTrack>,
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `request` and append its tracks. Returns the number added.
    pub async fn generate(
        &mut self,
        pipeline: &GenerationPipeline,
        request: &GenerationRequest,
    ) -> Result<usize, PipelineError> {
        pipeline.run_into(request, &mut self.tracks).await
    }

    pub fn tracks(&self) -> &[IngestedTrack] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn into_tracks(self) -> Vec<IngestedTrack> {
        self.tracks
    }
}
