use rankgraph_core::error::CoreError;
use rankgraph_core::types::{JobKind, TaskId};

use crate::transport::TransportError;

/// Errors surfaced to whatever initiated a submission.
///
/// Long-poll timeouts never appear here; the poller absorbs them.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The submission request for a job failed.
    #[error("Failed to submit {kind} job: {source}")]
    Submit {
        kind: JobKind,
        #[source]
        source: TransportError,
    },

    /// Polling a task failed with something other than a gateway timeout.
    #[error("Failed to poll task {task_id}: {source}")]
    Poll {
        task_id: TaskId,
        #[source]
        source: TransportError,
    },

    /// A submission response carried neither `task_id` nor `task_id_list`
    /// (or the one this job kind does not expect).
    #[error("Unknown submission response shape: {0}")]
    UnknownResponseShape(serde_json::Value),

    /// A poll result did not match the shape expected for its job kind.
    #[error("Malformed result for task {task_id}: {source}")]
    MalformedResult {
        task_id: TaskId,
        #[source]
        source: serde_json::Error,
    },

    /// A domain error, e.g. a file/node length mismatch.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The task id is not registered.
    #[error("Unknown task {0}")]
    UnknownTask(TaskId),

    /// A background submission task panicked or was aborted.
    #[error("Submission task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
