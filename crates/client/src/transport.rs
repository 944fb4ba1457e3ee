//! The transport capability the orchestrator depends on.
//!
//! [`HttpTransport`](crate::api::HttpTransport) implements it against
//! the REST backend; tests substitute a scripted stub.

use async_trait::async_trait;
use rankgraph_core::types::TaskId;

use crate::messages::SubmitRequest;

/// Outcome of one long-poll request.
#[derive(Debug, Clone, PartialEq)]
pub enum PollReply {
    /// The backend produced the task result; the body is returned as-is.
    Ready(serde_json::Value),
    /// The gateway gave up waiting. Re-issue the same request.
    GatewayTimeout,
}

/// Errors from a single transport call.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a status other than success or the long-poll
    /// timeout code.
    #[error("Backend error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (JSON error description) for logging.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit a job request and return the raw response body.
    async fn submit(&self, request: &SubmitRequest) -> Result<serde_json::Value, TransportError>;

    /// Issue one long-poll request for `task_id`.
    async fn check_task_result(&self, task_id: &TaskId) -> Result<PollReply, TransportError>;

    /// Probe backend liveness. `Ok(false)` means the backend answered
    /// with a non-success status.
    async fn heartbeat(&self) -> Result<bool, TransportError>;
}
