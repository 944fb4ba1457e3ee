//! Job records tracked for the lifetime of a session.

use chrono::Utc;
use serde::Serialize;

use crate::types::{JobKind, TaskId, Timestamp};

/// One submitted unit of work.
///
/// `complete` only ever moves from `false` to `true`. A job that errored
/// stays incomplete; there is no failed state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub task_id: TaskId,
    pub kind: JobKind,
    pub complete: bool,
    /// Sub-jobs and secondary jobs of a composite are hidden from the
    /// job list; only their parent is displayed.
    pub hidden: bool,
    pub created_at: Timestamp,
}

impl Job {
    /// A displayed, pending job.
    pub fn new(task_id: TaskId, kind: JobKind) -> Self {
        Self {
            task_id,
            kind,
            complete: false,
            hidden: false,
            created_at: Utc::now(),
        }
    }

    /// A pending job that is never surfaced on its own.
    pub fn hidden(task_id: TaskId, kind: JobKind) -> Self {
        Self {
            hidden: true,
            ..Self::new(task_id, kind)
        }
    }

    /// Flip `complete` to true. Returns `false` if it already was.
    pub fn mark_complete(&mut self) -> bool {
        let changed = !self.complete;
        self.complete = true;
        changed
    }
}
