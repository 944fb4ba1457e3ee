use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque identifier the backend assigns to one unit of asynchronous work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a client-side id for a composite job.
    ///
    /// The backend never issues an id for the displayed parent of a
    /// fan-out, so the client generates one that cannot collide with
    /// server-issued ids.
    pub fn composite() -> Self {
        Self(format!("composite-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The kinds of analysis job the backend offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Keyword extraction over free text.
    TextRank,
    /// Key sentence extraction over free text.
    SentenceExtraction,
    /// Transcribe a set of images, then rank the transcriptions together.
    ImageRank,
    /// Transcribe each image independently.
    ImageTranscribe,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::TextRank => "text_rank",
            JobKind::SentenceExtraction => "sentence_extraction",
            JobKind::ImageRank => "image_rank",
            JobKind::ImageTranscribe => "image_transcribe",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File suffixes the backend accepts for image uploads.
const IMAGE_SUFFIXES: &[&str] = &["jpg", "jpeg", "png"];

/// An image selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// File name sent in the multipart part; doubles as the image reference.
    pub name: String,
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Build an image from in-memory bytes, validating the file suffix.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, CoreError> {
        let name = name.into();
        let content_type = content_type_for(&name)
            .ok_or_else(|| CoreError::UnsupportedImage { name: name.clone() })?;
        Ok(Self {
            name,
            content_type: content_type.to_string(),
            bytes,
        })
    }

    /// Read an image from disk.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if content_type_for(&name).is_none() {
            return Err(CoreError::UnsupportedImage { name });
        }
        let bytes = std::fs::read(path)?;
        Self::new(name, bytes)
    }

    /// Reference a renderer can use as the node icon.
    pub fn image_ref(&self) -> &str {
        &self.name
    }
}

fn content_type_for(name: &str) -> Option<&'static str> {
    let suffix = name.rsplit_once('.')?.1.to_ascii_lowercase();
    if !IMAGE_SUFFIXES.contains(&suffix.as_str()) {
        return None;
    }
    Some(if suffix == "png" { "image/png" } else { "image/jpeg" })
}
