//! The JSON document printed once a job finishes.

use rankgraph_client::registry::SessionStats;
use rankgraph_client::Orchestrator;
use rankgraph_core::job::Job;
use rankgraph_core::result::ResultDescriptor;
use rankgraph_core::types::TaskId;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Report {
    /// The displayed jobs the command created.
    pub jobs: Vec<Job>,
    /// Results for those jobs that completed.
    pub results: Vec<ResultDescriptor>,
    pub stats: SessionStats,
}

impl Report {
    /// Gather the jobs and results for `task_ids` from the session.
    pub async fn collect(orchestrator: &Orchestrator, task_ids: &[TaskId]) -> Self {
        let mut jobs = Vec::with_capacity(task_ids.len());
        let mut results = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            if let Some(job) = orchestrator.job(task_id).await {
                jobs.push(job);
            }
            if let Some(result) = orchestrator.result(task_id).await {
                results.push(result);
            }
        }

        Self {
            jobs,
            results,
            stats: orchestrator.stats().await,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
