//! Request and response payloads exchanged with the backend.
//!
//! Submissions answer with either `{"task_id": ...}` or
//! `{"task_id_list": [...]}`; polls answer with `{"result": ...}`
//! whose shape depends on the job kind.

use rankgraph_core::entity::ScoredEntity;
use rankgraph_core::types::{ImageFile, TaskId};
use serde::Deserialize;

use crate::error::ClientError;

/// Separator the ranking worker splits the secondary-stage text on.
pub const DEFAULT_DELIMITER: &str = "|";

pub const TEXT_RANK_PATH: &str = "/text_rank";
pub const SENTENCE_EXTRACTION_PATH: &str = "/sentence_extraction";
pub const IMAGE_TRANSCRIBE_PATH: &str = "/image_transcribe";
pub const IMAGE_RANK_PATH: &str = "/create_image_rank_w_sentences_job";
pub const CHECK_TASK_RESULT_PATH: &str = "/check_task_result";
pub const HEARTBEAT_PATH: &str = "/heartbeat";

/// Multipart field repeated once per uploaded image.
pub const IMAGES_FIELD: &str = "images";

/// One request per submission endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRequest {
    TextRank { text: String },
    SentenceExtraction { text: String },
    ImageTranscribe { images: Vec<ImageFile> },
    ImageRankWithSentences { delimited_text: String },
}

impl SubmitRequest {
    pub fn endpoint(&self) -> &'static str {
        match self {
            SubmitRequest::TextRank { .. } => TEXT_RANK_PATH,
            SubmitRequest::SentenceExtraction { .. } => SENTENCE_EXTRACTION_PATH,
            SubmitRequest::ImageTranscribe { .. } => IMAGE_TRANSCRIBE_PATH,
            SubmitRequest::ImageRankWithSentences { .. } => IMAGE_RANK_PATH,
        }
    }

    /// JSON body for the JSON-encoded endpoints; `None` for multipart uploads.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        let body = match self {
            SubmitRequest::TextRank { text } | SubmitRequest::SentenceExtraction { text } => {
                serde_json::json!({ "text": text })
            }
            SubmitRequest::ImageRankWithSentences { delimited_text } => {
                serde_json::json!({ "delimited_text": delimited_text })
            }
            SubmitRequest::ImageTranscribe { .. } => return None,
        };
        Some(body)
    }
}

/// Task ids returned by a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskSubmission {
    Single(TaskId),
    Fanout(Vec<TaskId>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SubmissionShape {
    Single { task_id: TaskId },
    Fanout { task_id_list: Vec<TaskId> },
}

impl TaskSubmission {
    /// Interpret a submission response body.
    pub fn from_response(body: serde_json::Value) -> Result<Self, ClientError> {
        match serde_json::from_value::<SubmissionShape>(body.clone()) {
            Ok(SubmissionShape::Single { task_id }) => Ok(TaskSubmission::Single(task_id)),
            Ok(SubmissionShape::Fanout { task_id_list }) => {
                Ok(TaskSubmission::Fanout(task_id_list))
            }
            Err(_) => Err(ClientError::UnknownResponseShape(body)),
        }
    }

    pub fn into_single(self) -> Result<TaskId, ClientError> {
        match self {
            TaskSubmission::Single(id) => Ok(id),
            TaskSubmission::Fanout(ids) => Err(ClientError::UnknownResponseShape(
                serde_json::json!({ "task_id_list": ids }),
            )),
        }
    }

    pub fn into_list(self) -> Result<Vec<TaskId>, ClientError> {
        match self {
            TaskSubmission::Fanout(ids) => Ok(ids),
            TaskSubmission::Single(id) => Err(ClientError::UnknownResponseShape(
                serde_json::json!({ "task_id": id }),
            )),
        }
    }
}

/// The `{"result": ...}` envelope around every poll answer.
#[derive(Debug, Deserialize)]
pub struct TaskResult<T> {
    pub result: T,
}

impl<T: serde::de::DeserializeOwned> TaskResult<T> {
    /// Decode a poll body for `task_id`.
    pub fn decode(task_id: &TaskId, body: serde_json::Value) -> Result<T, ClientError> {
        serde_json::from_value::<TaskResult<T>>(body)
            .map(|envelope| envelope.result)
            .map_err(|source| ClientError::MalformedResult {
                task_id: task_id.clone(),
                source,
            })
    }
}

/// Keyword extraction result.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordResult {
    pub keyword_nodes: Vec<ScoredEntity>,
    /// Regenerated keyphrases with their scores, highest first.
    #[serde(default)]
    pub keyphrase_and_scores: Vec<(String, f64)>,
}

/// Secondary-stage result of a composite image ranking.
#[derive(Debug, Clone, Deserialize)]
pub struct RankedSentences {
    pub keyword_extraction_result: Vec<ScoredEntity>,
    /// Groups of node ids that cluster together.
    #[serde(default, deserialize_with = "clusters_from_any")]
    pub clusters: Option<Vec<Vec<String>>>,
}

fn clusters_from_any<'de, D>(deserializer: D) -> Result<Option<Vec<Vec<String>>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Vec<Vec<serde_json::Value>>>::deserialize(deserializer)?;
    Ok(raw.map(|groups| {
        groups
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|member| match member {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect()
    }))
}

/// Join sub-results into the single string the secondary stage expects.
///
/// The worker splits on `delimiter`, so any occurrence inside a part is
/// replaced with a space to keep one sentence per part.
pub fn join_delimited<S: AsRef<str>>(parts: &[S], delimiter: &str) -> String {
    parts
        .iter()
        .map(|part| {
            let part = part.as_ref();
            if delimiter.is_empty() {
                part.to_string()
            } else {
                part.replace(delimiter, " ")
            }
        })
        .collect::<Vec<_>>()
        .join(delimiter)
}
