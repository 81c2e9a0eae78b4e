//! Pure construction of metadata records from raw artifacts.

use chrono::{DateTime, Utc};

use super::types::{MetadataAttribute, MetadataRecord};
use crate::generation::{GenerationRequest, RawArtifact};

/// Separator used by the service between generation tags.
///
/// Splitting is literal: a tag that itself contains ", " comes back as two
/// genres.
pub const TAG_SEPARATOR: &str = ", ";

const UNTITLED: &str = "Untitled";
const UNKNOWN: &str = "Unknown";

/// Parse the service's tag string into a genre list.
pub fn parse_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|t| {
        t.split(TAG_SEPARATOR)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Round a fractional duration to whole seconds. Negative and NaN become 0.
pub fn whole_seconds(duration: f64) -> u64 {
    if duration.is_nan() || duration <= 0.0 {
        return 0;
    }
    duration.round() as u64
}

/// Format seconds as `m:ss`.
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Title to display; falls back to the request title, then "Untitled".
pub fn display_title(artifact: &RawArtifact, request: &GenerationRequest) -> String {
    if !artifact.title.trim().is_empty() {
        artifact.title.clone()
    } else {
        request
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string())
    }
}

/// Inputs that do not come from the artifact or the request.
#[derive(Debug, Clone)]
pub struct RecordContext<'a> {
    pub creator: &'a str,
    pub external_url: Option<&'a str>,
    pub generated_at: DateTime<Utc>,
}

/// Build the metadata record for an artifact. Never fails.
pub fn build_record(
    artifact: &RawArtifact,
    request: &GenerationRequest,
    ctx: &RecordContext<'_>,
) -> MetadataRecord {
    let genres = parse_tags(artifact.tags.as_deref());
    let duration = whole_seconds(artifact.duration);
    let model = artifact
        .model_name
        .clone()
        .or_else(|| request.model.clone())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let created = artifact.created_at.unwrap_or(ctx.generated_at);

    let genre_value = if genres.is_empty() {
        request
            .style
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string())
    } else {
        genres.join(TAG_SEPARATOR)
    };

    let attributes = vec![
        MetadataAttribute::new("Genre", genre_value),
        MetadataAttribute::new("Duration", format_duration(duration)),
        MetadataAttribute::new("Model", model.clone()),
        MetadataAttribute::new("Created", created.format("%Y-%m-%d").to_string()),
    ];

    MetadataRecord {
        name: display_title(artifact, request),
        description: request.prompt.clone(),
        image: artifact.image_url.clone(),
        external_url: ctx.external_url.map(str::to_string),
        duration,
        attributes,
        audio_url: artifact.audio_url.clone(),
        genres,
        creator: ctx.creator.to_string(),
        model,
        generated_at: ctx.generated_at,
    }
}
