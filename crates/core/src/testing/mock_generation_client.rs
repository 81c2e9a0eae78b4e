//! Mock generation client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::generation::{
    GenerationClient, GenerationError, GenerationRequest, StatusReport, TaskHandle,
};

/// Mock implementation of the GenerationClient trait.
///
/// Provides controllable behavior for testing:
/// - Script the status sequence each submitted task will report
/// - Track submissions and status queries for assertions
/// - Simulate transport failures on submission or on a given query
///
/// Each task walks through its script one report per query; the last report
/// repeats once the script is exhausted.
///
/// # Example
///
/// ```rust,ignore
/// let client = MockGenerationClient::new();
/// client
///     .script_next_task(vec![
///         StatusReport::pending(),
///         StatusReport::succeeded(vec![fixtures::raw_artifact("t1", "Chill", 31.4)]),
///     ])
///     .await;
///
/// let handle = client.submit(&GenerationRequest::new("lofi beat")).await?;
/// assert_eq!(client.query_status(&handle).await?.status, "PENDING");
/// assert_eq!(client.query_status(&handle).await?.status, "SUCCESS");
/// ```
#[derive(Debug, Clone)]
pub struct MockGenerationClient {
    /// Recorded submissions.
    submissions: Arc<RwLock<Vec<GenerationRequest>>>,
    /// Scripts waiting to be assigned to the next submitted tasks.
    pending_scripts: Arc<RwLock<VecDeque<Vec<StatusReport>>>>,
    /// Remaining reports per task id.
    tasks: Arc<RwLock<HashMap<String, VecDeque<StatusReport>>>>,
    /// Recorded status queries (task ids, in order).
    queries: Arc<RwLock<Vec<String>>>,
    /// If set, the next submission fails with this error.
    submit_error: Arc<RwLock<Option<GenerationError>>>,
    /// Errors keyed by 1-based global query number.
    query_errors: Arc<RwLock<HashMap<usize, GenerationError>>>,
    /// Counter for generating unique task ids.
    task_counter: Arc<RwLock<u32>>,
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationClient {
    /// Create a new mock client. Unscripted tasks stay pending forever.
    pub fn new() -> Self {
        Self {
            submissions: Arc::new(RwLock::new(Vec::new())),
            pending_scripts: Arc::new(RwLock::new(VecDeque::new())),
            tasks: Arc::new(RwLock::new(HashMap::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            submit_error: Arc::new(RwLock::new(None)),
            query_errors: Arc::new(RwLock::new(HashMap::new())),
            task_counter: Arc::new(RwLock::new(0)),
        }
    }

    // =========================================================================
    // Scripting
    // =========================================================================

    /// Queue the status sequence for the next submitted task.
    pub async fn script_next_task(&self, reports: Vec<StatusReport>) {
        self.pending_scripts.write().await.push_back(reports);
    }

    /// Replace the remaining status sequence of an existing task.
    pub async fn script_task(&self, handle: &TaskHandle, reports: Vec<StatusReport>) {
        self.tasks
            .write()
            .await
            .insert(handle.to_string(), reports.into_iter().collect());
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Get all recorded submissions.
    pub async fn submissions(&self) -> Vec<GenerationRequest> {
        self.submissions.read().await.clone()
    }

    /// Get the task ids of all recorded status queries.
    pub async fn queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }

    /// Get the number of status queries performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next submission to fail with the given error.
    pub async fn set_submit_error(&self, error: GenerationError) {
        *self.submit_error.write().await = Some(error);
    }

    /// Configure the n-th status query (1-based, across all tasks) to fail.
    pub async fn fail_query(&self, query_number: usize, error: GenerationError) {
        self.query_errors.write().await.insert(query_number, error);
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<TaskHandle, GenerationError> {
        if let Some(error) = self.submit_error.write().await.take() {
            return Err(error);
        }

        self.submissions.write().await.push(request.clone());

        let task_id = {
            let mut counter = self.task_counter.write().await;
            *counter += 1;
            format!("task-{}", *counter)
        };

        let script = self
            .pending_scripts
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| vec![StatusReport::pending()]);
        self.tasks
            .write()
            .await
            .insert(task_id.clone(), script.into_iter().collect());

        Ok(TaskHandle::new(task_id))
    }

    async fn query_status(&self, handle: &TaskHandle) -> Result<StatusReport, GenerationError> {
        let query_number = {
            let mut queries = self.queries.write().await;
            queries.push(handle.to_string());
            queries.len()
        };

        if let Some(error) = self.query_errors.write().await.remove(&query_number) {
            return Err(error);
        }

        let mut tasks = self.tasks.write().await;
        let script = tasks
            .get_mut(handle.as_str())
            .ok_or_else(|| GenerationError::ApiError {
                status: 404,
                message: format!("unknown task {}", handle),
            })?;

        let report = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };

        Ok(report.unwrap_or_else(StatusReport::pending))
    }
}
