//! Long-poll a task until the backend produces its result.
//!
//! The backend holds `check_task_result` open until the task finishes
//! or its gateway times out. A timeout is not a failure: the poller
//! re-issues the identical request, without bound, until the backend
//! answers definitively. Deciding when to give up is the backend's job.

use std::sync::Arc;

use rankgraph_core::types::TaskId;

use crate::error::ClientError;
use crate::transport::{PollReply, Transport};

#[derive(Clone)]
pub struct TaskPoller {
    transport: Arc<dyn Transport>,
}

impl TaskPoller {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Wait until `task_id` resolves and return the poll body unchanged.
    ///
    /// Any transport failure other than the gateway timeout surfaces as
    /// [`ClientError::Poll`].
    pub async fn poll(&self, task_id: &TaskId) -> Result<serde_json::Value, ClientError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let reply = self
                .transport
                .check_task_result(task_id)
                .await
                .map_err(|source| {
                    tracing::warn!(task_id = %task_id, attempt, error = %source, "Poll failed");
                    ClientError::Poll {
                        task_id: task_id.clone(),
                        source,
                    }
                })?;

            match reply {
                PollReply::Ready(body) => {
                    tracing::debug!(task_id = %task_id, attempt, "Task result received");
                    return Ok(body);
                }
                PollReply::GatewayTimeout => {
                    tracing::debug!(task_id = %task_id, attempt, "Long poll timed out, retrying");
                }
            }
        }
    }
}
