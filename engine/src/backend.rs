//! Backend collaborator boundary.
//!
//! The engine never assumes how operations reach the workflow service; it
//! talks to a [`WorkflowBackend`]. [`HttpBackend`] is the JSON-over-HTTP
//! implementation used by the binary.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use waypoint_types::{Operation, StatusSnapshot};

use crate::config::BackendSettings;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

pub const STATUS_PATH: &str = "/api/workflow/status";

/// Endpoint that performs `operation`.
#[must_use]
pub const fn endpoint(operation: Operation) -> &'static str {
    match operation {
        Operation::CreateBaseline => "/api/baseline",
        Operation::GenerateTimeline => "/api/timeline/generate",
        Operation::CommitTimeline => "/api/timeline/commit",
        Operation::StartProgressTracking => "/api/progress/start",
        Operation::RequestAnalytics => "/api/analytics",
        Operation::SubmitAssessment => "/api/assessment/submit",
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BackendError {
    /// Short form for the notification area.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            BackendError::Client(_) => "Backend client unavailable".to_owned(),
            BackendError::Request { .. } => "Could not reach the workflow service".to_owned(),
            BackendError::Status { status, .. } => {
                format!("Workflow service rejected the request ({status})")
            }
            BackendError::Decode { .. } => "Workflow service sent an invalid response".to_owned(),
        }
    }
}

/// The workflow service, as seen by the engine.
pub trait WorkflowBackend: Send + Sync + 'static {
    /// Current status flags for rehydration.
    fn fetch_status(&self) -> impl Future<Output = Result<StatusSnapshot, BackendError>> + Send;

    /// Perform a state-changing or data request. Success means the backend
    /// confirmed the operation.
    fn perform(
        &self,
        operation: Operation,
        payload: Value,
    ) -> impl Future<Output = Result<Value, BackendError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(BackendError::Client)?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read_body(url: String, response: reqwest::Response) -> Result<Value, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            return Err(BackendError::Status { url, status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| BackendError::Request {
                url: url.clone(),
                source,
            })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|source| BackendError::Decode { url, source })
    }
}

impl WorkflowBackend for HttpBackend {
    async fn fetch_status(&self) -> Result<StatusSnapshot, BackendError> {
        let url = self.url(STATUS_PATH);
        debug!(%url, "Fetching workflow status");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                url: url.clone(),
                source,
            })?;
        let body = Self::read_body(url.clone(), response).await?;
        serde_json::from_value(body).map_err(|source| BackendError::Decode { url, source })
    }

    async fn perform(&self, operation: Operation, payload: Value) -> Result<Value, BackendError> {
        let url = self.url(endpoint(operation));
        debug!(%url, %operation, "Sending operation");
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                url: url.clone(),
                source,
            })?;
        Self::read_body(url, response).await
    }
}

async fn read_capped_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
