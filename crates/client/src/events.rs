//! Change notifications emitted by the orchestrator.
//!
//! Presentation layers subscribe to these instead of reaching into
//! orchestrator state. Every event names the job it concerns; the
//! current state can be read back through the orchestrator accessors.

use rankgraph_core::types::{JobKind, TaskId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// A job was registered.
    JobCreated {
        task_id: TaskId,
        kind: JobKind,
        hidden: bool,
    },

    /// A job completed and its result, if any, is in the cache.
    JobCompleted { task_id: TaskId, kind: JobKind },

    /// The flow driving a job errored. The job stays pending.
    JobFailed { task_id: TaskId, error: String },

    /// The selection cursor moved.
    SelectionChanged { task_id: TaskId },
}
