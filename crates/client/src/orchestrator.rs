//! Drives each job kind's submission protocol to completion.
//!
//! [`Orchestrator`] owns the session state (job registry and result
//! cache) and runs one handler per [`JobRequest`] variant:
//!
//! - text ranking and sentence extraction: submit, poll one task, render;
//! - image transcription: submit, then poll every returned task
//!   independently, each producing its own result;
//! - image ranking: submit the transcriptions as hidden sub-jobs, wait
//!   for all of them, submit their joined text as a secondary job, and
//!   render the ranked images once that resolves.
//!
//! Job lifecycle changes are broadcast as [`JobEvent`]s. Call
//! [`Orchestrator::subscribe`] to receive them.

use std::sync::Arc;

use futures::future::join_all;
use rankgraph_core::entity::ScoredEntity;
use rankgraph_core::error::CoreError;
use rankgraph_core::graph::{self, GraphStyle};
use rankgraph_core::job::Job;
use rankgraph_core::result::ResultDescriptor;
use rankgraph_core::types::{ImageFile, JobKind, TaskId};
use tokio::sync::{broadcast, RwLock};

use crate::cache::ResultCache;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::JobEvent;
use crate::messages::{
    join_delimited, KeywordResult, RankedSentences, SubmitRequest, TaskResult, TaskSubmission,
    DEFAULT_DELIMITER,
};
use crate::poller::TaskPoller;
use crate::registry::{JobRegistry, SessionStats};
use crate::transport::Transport;

/// Broadcast channel capacity for job events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A user's request for one analysis job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobRequest {
    TextRank(String),
    SentenceExtraction(String),
    ImageTranscribe(Vec<ImageFile>),
    ImageRank(Vec<ImageFile>),
}

impl JobRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            JobRequest::TextRank(_) => JobKind::TextRank,
            JobRequest::SentenceExtraction(_) => JobKind::SentenceExtraction,
            JobRequest::ImageTranscribe(_) => JobKind::ImageTranscribe,
            JobRequest::ImageRank(_) => JobKind::ImageRank,
        }
    }
}

/// Registry and cache, always locked together.
#[derive(Debug, Default)]
struct SessionState {
    registry: JobRegistry,
    results: ResultCache,
}

/// Turns a poll body into the descriptor for a single-stage job.
type Renderer = fn(&Orchestrator, &TaskId, serde_json::Value) -> Result<ResultDescriptor, ClientError>;

pub struct Orchestrator {
    poller: TaskPoller,
    transport: Arc<dyn Transport>,
    state: RwLock<SessionState>,
    event_tx: broadcast::Sender<JobEvent>,
    style: GraphStyle,
    delimiter: String,
}

impl Orchestrator {
    /// Create an orchestrator with the default graph style and delimiter.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_style(transport, GraphStyle::default(), DEFAULT_DELIMITER.to_string())
    }

    /// Create an orchestrator using the graph style and delimiter from `config`.
    pub fn from_config(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self::with_style(transport, config.graph_style.clone(), config.delimiter.clone())
    }

    pub fn with_style(transport: Arc<dyn Transport>, style: GraphStyle, delimiter: String) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            poller: TaskPoller::new(Arc::clone(&transport)),
            transport,
            state: RwLock::new(SessionState::default()),
            event_tx,
            style,
            delimiter,
        }
    }

    /// Subscribe to job lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.event_tx.subscribe()
    }

    /// Run a job to completion.
    ///
    /// Resolves with the ids of the displayed jobs created. On error the
    /// affected jobs stay pending and a [`JobEvent::JobFailed`] is
    /// broadcast for each.
    pub async fn submit(&self, request: JobRequest) -> Result<Vec<TaskId>, ClientError> {
        let kind = request.kind();
        tracing::info!(kind = %kind, "Submitting job");

        match request {
            JobRequest::TextRank(text) => {
                let request = SubmitRequest::TextRank { text };
                let id = self.run_single(kind, request, Self::render_text_rank).await?;
                Ok(vec![id])
            }
            JobRequest::SentenceExtraction(text) => {
                let request = SubmitRequest::SentenceExtraction { text };
                let id = self.run_single(kind, request, Self::render_sentences).await?;
                Ok(vec![id])
            }
            JobRequest::ImageTranscribe(images) => self.run_image_transcribe(images).await,
            JobRequest::ImageRank(images) => Ok(vec![self.run_image_rank(images).await?]),
        }
    }

    /// Run a job on a background task.
    pub fn spawn(
        self: &Arc<Self>,
        request: JobRequest,
    ) -> tokio::task::JoinHandle<Result<Vec<TaskId>, ClientError>> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.submit(request).await })
    }

    // ---- session accessors ----

    /// Snapshot of every job, displayed and hidden, in creation order.
    pub async fn jobs(&self) -> Vec<Job> {
        self.state.read().await.registry.iter().cloned().collect()
    }

    /// Snapshot of the displayed jobs in creation order.
    pub async fn displayed_jobs(&self) -> Vec<Job> {
        self.state.read().await.registry.displayed().cloned().collect()
    }

    pub async fn job(&self, task_id: &TaskId) -> Option<Job> {
        self.state.read().await.registry.get(task_id).cloned()
    }

    /// The result for a registered job, if it has one.
    pub async fn result(&self, task_id: &TaskId) -> Option<ResultDescriptor> {
        let state = self.state.read().await;
        if !state.registry.contains(task_id) {
            return None;
        }
        state.results.get(task_id).cloned()
    }

    pub async fn select(&self, task_id: &TaskId) -> Result<(), ClientError> {
        self.state.write().await.registry.select(task_id)?;
        let _ = self.event_tx.send(JobEvent::SelectionChanged {
            task_id: task_id.clone(),
        });
        Ok(())
    }

    pub async fn selected(&self) -> Option<Job> {
        self.state.read().await.registry.selected().cloned()
    }

    /// The result of the selected job, once it is complete.
    pub async fn selected_result(&self) -> Option<ResultDescriptor> {
        let state = self.state.read().await;
        let job = state.registry.selected()?;
        state.results.get(&job.task_id).cloned()
    }

    pub async fn stats(&self) -> SessionStats {
        self.state.read().await.registry.stats()
    }

    // ---- job protocols ----

    /// Submit, poll one task, render.
    async fn run_single(
        &self,
        kind: JobKind,
        request: SubmitRequest,
        render: Renderer,
    ) -> Result<TaskId, ClientError> {
        let task_id = self.submit_request(kind, &request).await?.into_single()?;
        self.register(Job::new(task_id.clone(), kind)).await;

        let outcome = self
            .poller
            .poll(&task_id)
            .await
            .and_then(|body| render(self, &task_id, body));
        self.settle(&task_id, kind, outcome).await?;
        Ok(task_id)
    }

    /// Submit N images and let every transcription resolve on its own.
    async fn run_image_transcribe(&self, images: Vec<ImageFile>) -> Result<Vec<TaskId>, ClientError> {
        let kind = JobKind::ImageTranscribe;
        let request = SubmitRequest::ImageTranscribe {
            images: images.clone(),
        };
        let task_ids = self.submit_request(kind, &request).await?.into_list()?;
        for task_id in &task_ids {
            self.register(Job::new(task_id.clone(), kind)).await;
        }
        tracing::info!(count = task_ids.len(), "Image transcription fanned out");

        let outcomes = join_all(
            task_ids
                .iter()
                .enumerate()
                .map(|(index, task_id)| self.transcribe(task_id, images.get(index))),
        )
        .await;

        outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(task_ids)
    }

    /// Transcribe N images as hidden sub-jobs, then rank the transcriptions.
    ///
    /// The displayed parent completes only after every sub-job and the
    /// secondary ranking job have resolved.
    async fn run_image_rank(&self, images: Vec<ImageFile>) -> Result<TaskId, ClientError> {
        let kind = JobKind::ImageRank;
        let request = SubmitRequest::ImageTranscribe {
            images: images.clone(),
        };
        let sub_ids = self.submit_request(kind, &request).await?.into_list()?;
        if sub_ids.len() != images.len() {
            tracing::error!(
                files = images.len(),
                tasks = sub_ids.len(),
                "Transcription task count does not match uploaded files",
            );
            return Err(CoreError::LengthMismatch {
                files: images.len(),
                nodes: sub_ids.len(),
            }
            .into());
        }

        let parent = TaskId::composite();
        self.register(Job::new(parent.clone(), kind)).await;
        for sub_id in &sub_ids {
            self.register(Job::hidden(sub_id.clone(), JobKind::ImageTranscribe))
                .await;
        }
        tracing::info!(parent = %parent, count = sub_ids.len(), "Image ranking fanned out");

        let outcome = self.rank_images(&parent, &images, &sub_ids).await;
        self.settle(&parent, kind, outcome).await?;
        Ok(parent)
    }

    async fn rank_images(
        &self,
        parent: &TaskId,
        images: &[ImageFile],
        sub_ids: &[TaskId],
    ) -> Result<ResultDescriptor, ClientError> {
        // Barrier: every sub-job runs to completion before the first
        // error, if any, is surfaced.
        let outcomes = join_all(
            sub_ids
                .iter()
                .enumerate()
                .map(|(index, sub_id)| self.transcribe(sub_id, images.get(index))),
        )
        .await;
        let captions = outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;

        let delimited_text = join_delimited(&captions, &self.delimiter);
        let request = SubmitRequest::ImageRankWithSentences { delimited_text };
        let secondary = self
            .submit_request(JobKind::ImageRank, &request)
            .await?
            .into_single()?;
        self.register(Job::hidden(secondary.clone(), JobKind::ImageRank))
            .await;
        tracing::debug!(parent = %parent, secondary = %secondary, "Secondary ranking submitted");

        let ranked = self
            .poller
            .poll(&secondary)
            .await
            .and_then(|body| TaskResult::<RankedSentences>::decode(&secondary, body))
            .inspect_err(|e| self.fail(&secondary, e))?;
        self.complete(&secondary, JobKind::ImageRank, None).await;

        let graph = graph::from_image_entities(
            images,
            &ranked.keyword_extraction_result,
            ranked.clusters.as_deref(),
            &self.style,
        )?;
        Ok(ResultDescriptor::new(parent.clone()).with_graph(graph))
    }

    /// Poll one transcription task, store its caption, and return it.
    async fn transcribe(
        &self,
        task_id: &TaskId,
        image: Option<&ImageFile>,
    ) -> Result<String, ClientError> {
        let caption = self
            .poller
            .poll(task_id)
            .await
            .and_then(|body| TaskResult::<String>::decode(task_id, body));

        match &caption {
            Ok(text) => {
                let mut descriptor = ResultDescriptor::new(task_id.clone()).with_text(text.clone());
                if let Some(image) = image {
                    descriptor = descriptor.with_image_ref(image.image_ref());
                }
                self.complete(task_id, JobKind::ImageTranscribe, Some(descriptor))
                    .await;
            }
            Err(e) => self.fail(task_id, e),
        }
        caption
    }

    // ---- renderers ----

    fn render_text_rank(
        &self,
        task_id: &TaskId,
        body: serde_json::Value,
    ) -> Result<ResultDescriptor, ClientError> {
        let result: KeywordResult = TaskResult::decode(task_id, body)?;
        let graph = graph::from_scored_entities(&result.keyword_nodes, &self.style);
        let mut descriptor = ResultDescriptor::new(task_id.clone()).with_graph(graph);
        if !result.keyphrase_and_scores.is_empty() {
            descriptor = descriptor.with_text(format_keyphrases(&result.keyphrase_and_scores));
        }
        Ok(descriptor)
    }

    fn render_sentences(
        &self,
        task_id: &TaskId,
        body: serde_json::Value,
    ) -> Result<ResultDescriptor, ClientError> {
        let sentences: Vec<ScoredEntity> = TaskResult::decode(task_id, body)?;
        let graph = graph::from_scored_entities(&sentences, &self.style);
        Ok(ResultDescriptor::new(task_id.clone())
            .with_text(format_ranked_sentences(&sentences))
            .with_graph(graph))
    }

    // ---- private helpers ----

    async fn submit_request(
        &self,
        kind: JobKind,
        request: &SubmitRequest,
    ) -> Result<TaskSubmission, ClientError> {
        let body = self.transport.submit(request).await.map_err(|source| {
            tracing::error!(kind = %kind, endpoint = request.endpoint(), error = %source, "Submission failed");
            ClientError::Submit { kind, source }
        })?;
        TaskSubmission::from_response(body)
    }

    async fn register(&self, job: Job) {
        let event = JobEvent::JobCreated {
            task_id: job.task_id.clone(),
            kind: job.kind,
            hidden: job.hidden,
        };
        let appended = self.state.write().await.registry.append(job);
        if appended {
            let _ = self.event_tx.send(event);
        }
    }

    /// Mark a job complete and store its result in one critical section.
    async fn complete(&self, task_id: &TaskId, kind: JobKind, descriptor: Option<ResultDescriptor>) {
        {
            let mut state = self.state.write().await;
            let SessionState { registry, results } = &mut *state;
            registry.mark_complete(task_id);
            if let Some(descriptor) = descriptor {
                results.set(registry, task_id.clone(), descriptor);
            }
        }
        let _ = self.event_tx.send(JobEvent::JobCompleted {
            task_id: task_id.clone(),
            kind,
        });
    }

    /// Report a failed flow. The job stays pending.
    fn fail(&self, task_id: &TaskId, error: &ClientError) {
        tracing::warn!(task_id = %task_id, error = %error, "Job flow failed, job left pending");
        let _ = self.event_tx.send(JobEvent::JobFailed {
            task_id: task_id.clone(),
            error: error.to_string(),
        });
    }

    async fn settle(
        &self,
        task_id: &TaskId,
        kind: JobKind,
        outcome: Result<ResultDescriptor, ClientError>,
    ) -> Result<(), ClientError> {
        match outcome {
            Ok(descriptor) => {
                self.complete(task_id, kind, Some(descriptor)).await;
                Ok(())
            }
            Err(e) => {
                self.fail(task_id, &e);
                Err(e)
            }
        }
    }
}

/// One `phrase (score)` line per keyphrase, in the order given.
fn format_keyphrases(keyphrases: &[(String, f64)]) -> String {
    keyphrases
        .iter()
        .map(|(phrase, score)| format!("{phrase} ({score:.3})"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sentences ordered by descending score, one per line.
fn format_ranked_sentences(sentences: &[ScoredEntity]) -> String {
    let mut ranked: Vec<&ScoredEntity> = sentences.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
        .into_iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
