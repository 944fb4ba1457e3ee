//! Ordered store of every job created during a session.

use std::collections::HashMap;

use rankgraph_core::job::Job;
use rankgraph_core::types::TaskId;
use serde::Serialize;

use crate::error::ClientError;

/// Job counts derived from the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub displayed: usize,
    pub hidden: usize,
    pub pending: usize,
    pub complete: usize,
}

/// Jobs in insertion order, indexed by task id, with a selection cursor.
///
/// Jobs are never removed.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Vec<Job>,
    index: HashMap<TaskId, usize>,
    selected: Option<usize>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job at the end of the sequence.
    ///
    /// The first displayed job appended becomes the selection. Returns
    /// `false` (and keeps the existing record) if the id is already
    /// registered.
    pub fn append(&mut self, job: Job) -> bool {
        if self.index.contains_key(&job.task_id) {
            tracing::warn!(task_id = %job.task_id, "Job already registered, ignoring");
            return false;
        }

        let position = self.jobs.len();
        if self.selected.is_none() && !job.hidden {
            self.selected = Some(position);
        }
        self.index.insert(job.task_id.clone(), position);
        self.jobs.push(job);
        true
    }

    /// Mark a job complete. Idempotent.
    ///
    /// An unknown id is logged and ignored; a completion can race ahead
    /// of registration. Returns `true` if the job exists.
    pub fn mark_complete(&mut self, task_id: &TaskId) -> bool {
        match self.index.get(task_id) {
            Some(&position) => {
                if self.jobs[position].mark_complete() {
                    tracing::info!(task_id = %task_id, kind = %self.jobs[position].kind, "Job complete");
                }
                true
            }
            None => {
                tracing::warn!(task_id = %task_id, "Completion for unregistered job");
                false
            }
        }
    }

    /// Move the selection cursor. Does not touch completion state.
    pub fn select(&mut self, task_id: &TaskId) -> Result<(), ClientError> {
        let position = *self
            .index
            .get(task_id)
            .ok_or_else(|| ClientError::UnknownTask(task_id.clone()))?;
        self.selected = Some(position);
        Ok(())
    }

    pub fn selected(&self) -> Option<&Job> {
        self.selected.map(|position| &self.jobs[position])
    }

    pub fn get(&self, task_id: &TaskId) -> Option<&Job> {
        self.index.get(task_id).map(|&position| &self.jobs[position])
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.index.contains_key(task_id)
    }

    /// All jobs, displayed and hidden, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Displayed jobs in insertion order.
    pub fn displayed(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|job| !job.hidden)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn stats(&self) -> SessionStats {
        self.jobs
            .iter()
            .fold(SessionStats::default(), |mut stats, job| {
                if job.hidden {
                    stats.hidden += 1;
                } else {
                    stats.displayed += 1;
                }
                if job.complete {
                    stats.complete += 1;
                } else {
                    stats.pending += 1;
                }
                stats
            })
    }
}
