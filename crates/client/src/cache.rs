//! Rendered results keyed by task id.

use std::collections::HashMap;

use rankgraph_core::result::ResultDescriptor;
use rankgraph_core::types::TaskId;

use crate::registry::JobRegistry;

#[derive(Debug, Default)]
pub struct ResultCache {
    results: HashMap<TaskId, ResultDescriptor>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the descriptor for `task_id`, replacing any previous one.
    ///
    /// The write happens even when `registry` has no such job; that case
    /// is only logged. Readers that need the pairing must check the
    /// registry themselves.
    pub fn set(&mut self, registry: &JobRegistry, task_id: TaskId, descriptor: ResultDescriptor) {
        if !registry.contains(&task_id) {
            tracing::warn!(task_id = %task_id, "Storing result for unregistered job");
        }
        if self.results.insert(task_id.clone(), descriptor).is_some() {
            tracing::debug!(task_id = %task_id, "Replaced existing result");
        }
    }

    pub fn get(&self, task_id: &TaskId) -> Option<&ResultDescriptor> {
        self.results.get(task_id)
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.results.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
