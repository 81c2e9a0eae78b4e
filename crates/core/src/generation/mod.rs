//! Music generation service integration.
//!
//! This module provides a `GenerationClient` trait for submitting generation
//! jobs and querying their status. Clients never retry on their own; retry
//! and wait policy belongs to the [`crate::poller::CompletionPoller`].

mod http;
mod types;

pub use http::HttpGenerationClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Service answered with a non-success HTTP status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Service answered 200 but reported a non-success code in the body.
    #[error("service rejected request: code {code} - {message}")]
    Rejected { code: i64, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// A client for an asynchronous generation service.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Returns the name of this client implementation.
    fn name(&self) -> &str;

    /// Submit a generation job and return its handle.
    async fn submit(&self, request: &GenerationRequest) -> Result<TaskHandle, GenerationError>;

    /// Query the current status of a submitted job.
    async fn query_status(&self, handle: &TaskHandle) -> Result<StatusReport, GenerationError>;
}
