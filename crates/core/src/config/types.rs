use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::poller::PollPolicy;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Generation service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Service base URL (default: "https://api.sunoapi.org")
    #[serde(default = "default_generation_url")]
    pub base_url: String,
    /// Bearer credential sent with every request
    #[serde(default)]
    pub api_key: String,
    /// Completion callback used when a request does not name one
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Model used when a request does not name one
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_url(),
            api_key: String::new(),
            callback_url: None,
            model: default_model(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_generation_url() -> String {
    "https://api.sunoapi.org".to_string()
}

fn default_model() -> String {
    "V4_5".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Content-addressed storage (IPFS pinning service) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Pinning API base URL
    #[serde(default = "default_storage_url")]
    pub api_url: String,
    /// Pinning service JWT. Without it every upload fails and tracks degrade.
    #[serde(default)]
    pub jwt: Option<String>,
    /// Gateway used to build browsable links for pinned content
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Request timeout in seconds (default: 120, media uploads are large)
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_url: default_storage_url(),
            jwt: None,
            gateway_url: default_gateway_url(),
            timeout_secs: default_storage_timeout(),
        }
    }
}

fn default_storage_url() -> String {
    "https://api.pinata.cloud".to_string()
}

fn default_gateway_url() -> String {
    "https://gateway.pinata.cloud/ipfs".to_string()
}

fn default_storage_timeout() -> u64 {
    120
}

/// Completion polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerConfig {
    /// Wait between status queries in milliseconds (default: 10000)
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    /// Status queries before giving up with a timeout (default: 30)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollerConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            max_attempts: self.max_attempts,
        }
    }
}

fn default_interval() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    30
}

/// Artifact ingestion configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Creator label attributed to every track
    #[serde(default = "default_creator_label")]
    pub creator_label: String,
    /// Pin the audio file itself, not only the metadata (default: true)
    #[serde(default = "default_pin_media")]
    pub pin_media: bool,
    /// Artifacts ingested at the same time (default: 1, sequential)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_ingests: usize,
    /// External URL written into every metadata record
    #[serde(default)]
    pub external_url: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            creator_label: default_creator_label(),
            pin_media: default_pin_media(),
            max_concurrent_ingests: default_max_concurrent(),
            external_url: None,
        }
    }
}

fn default_creator_label() -> String {
    "Trackforge AI".to_string()
}

fn default_pin_media() -> bool {
    true
}

fn default_max_concurrent() -> usize {
    1
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub generation: SanitizedGenerationConfig,
    pub storage: SanitizedStorageConfig,
    pub poller: PollerConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGenerationConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub api_url: String,
    pub jwt_configured: bool,
    pub gateway_url: String,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            generation: SanitizedGenerationConfig {
                base_url: config.generation.base_url.clone(),
                api_key_configured: !config.generation.api_key.is_empty(),
                callback_url: config.generation.callback_url.clone(),
                model: config.generation.model.clone(),
                timeout_secs: config.generation.timeout_secs,
            },
            storage: SanitizedStorageConfig {
                api_url: config.storage.api_url.clone(),
                jwt_configured: config
                    .storage
                    .jwt
                    .as_ref()
                    .is_some_and(|jwt| !jwt.is_empty()),
                gateway_url: config.storage.gateway_url.clone(),
                timeout_secs: config.storage.timeout_secs,
            },
            poller: config.poller.clone(),
            ingest: config.ingest.clone(),
        }
    }
}
