use serde::Serialize;

use crate::graph::GraphDocument;
use crate::types::TaskId;

/// The rendered outcome of one completed job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultDescriptor {
    pub task_id: TaskId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphDocument>,
}

impl ResultDescriptor {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            text: None,
            image_ref: None,
            graph: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    pub fn with_graph(mut self, graph: GraphDocument) -> Self {
        self.graph = Some(graph);
        self
    }
}
