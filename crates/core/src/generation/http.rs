//! HTTP client for a Suno-style generation API.
//!
//! The API wraps every payload in a `{code, msg, data}` envelope. A 200 HTTP
//! status with a non-200 body code is still a failure.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{GenerationRequest, RawArtifact, StatusReport, TaskHandle};
use super::{GenerationClient, GenerationError};
use crate::config::GenerationConfig;

/// HTTP generation client.
pub struct HttpGenerationClient {
    client: Client,
    base_url: String,
    default_model: String,
    default_callback_url: Option<String>,
}

impl HttpGenerationClient {
    /// Create a new client. The bearer credential is attached to every request.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::NotConfigured(
                "generation.api_key is empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| GenerationError::NotConfigured(format!("invalid api key: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_model: config.model.clone(),
            default_callback_url: config.callback_url.clone(),
        })
    }

    fn body_for(&self, request: &GenerationRequest) -> GenerateBody {
        GenerateBody {
            prompt: request.prompt.clone(),
            style: request.style.clone(),
            title: request.title.clone(),
            custom_mode: request.is_custom_mode(),
            instrumental: request.instrumental,
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            negative_tags: request.negative_tags.clone(),
            call_back_url: request
                .callback_url
                .clone()
                .or_else(|| self.default_callback_url.clone()),
        }
    }

    async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GenerationError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<TaskHandle, GenerationError> {
        let url = format!("{}/api/v1/generate", self.base_url);
        debug!(
            "Submitting generation: request_id={}, prompt='{}'",
            request.request_id, request.prompt
        );

        let response = self
            .client
            .post(&url)
            .json(&self.body_for(request))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let envelope: Envelope<SubmitData> = response.json().await.map_err(|e| {
            GenerationError::ParseError(format!("Failed to parse submit response: {}", e))
        })?;
        let data = envelope.into_data()?;

        if data.task_id.is_empty() {
            return Err(GenerationError::ParseError(
                "submit response carried an empty taskId".to_string(),
            ));
        }

        Ok(TaskHandle::new(data.task_id))
    }

    async fn query_status(&self, handle: &TaskHandle) -> Result<StatusReport, GenerationError> {
        let url = format!("{}/api/v1/generate/record-info", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("taskId", handle.as_str())])
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let envelope: Envelope<RecordInfo> = response.json().await.map_err(|e| {
            GenerationError::ParseError(format!("Failed to parse status response: {}", e))
        })?;
        let info = envelope.into_data()?;

        debug!("Task {} status: {}", handle, info.status);

        Ok(info.into())
    }
}

// ============================================================================
// Wire types (private)
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    custom_mode: bool,
    instrumental: bool,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    call_back_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, GenerationError> {
        if self.code != 200 {
            return Err(GenerationError::Rejected {
                code: self.code,
                message: self.msg.unwrap_or_default(),
            });
        }
        self.data
            .ok_or_else(|| GenerationError::ParseError("response is missing data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitData {
    #[serde(default)]
    task_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordInfo {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    response: Option<RecordResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordResponse {
    #[serde(default)]
    suno_data: Vec<WireTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTrack {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    audio_url: Option<String>,
    #[serde(default)]
    stream_audio_url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    create_time: Option<serde_json::Value>,
}

/// `createTime` shows up either as epoch millis or as an RFC 3339 string.
fn parse_create_time(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                s.parse::<i64>()
                    .ok()
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            }),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<WireTrack> for RawArtifact {
    fn from(track: WireTrack) -> Self {
        let created_at = track.create_time.as_ref().and_then(parse_create_time);
        RawArtifact {
            id: track.id,
            title: track.title,
            duration: track.duration.unwrap_or(0.0),
            audio_url: track.audio_url.unwrap_or_default(),
            stream_audio_url: non_empty(track.stream_audio_url),
            image_url: non_empty(track.image_url),
            tags: non_empty(track.tags),
            model_name: non_empty(track.model_name),
            created_at,
        }
    }
}

impl From<RecordInfo> for StatusReport {
    fn from(info: RecordInfo) -> Self {
        let artifacts = info
            .response
            .map(|r| r.suno_data.into_iter().map(RawArtifact::from).collect())
            .unwrap_or_default();

        StatusReport {
            status: info.status,
            error_message: non_empty(info.error_message),
            artifacts,
        }
    }
}
