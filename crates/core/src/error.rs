#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The uploaded files and the ranked nodes returned for them are
    /// co-indexed and must have the same length.
    #[error("Length mismatch: {files} files but {nodes} ranked nodes")]
    LengthMismatch { files: usize, nodes: usize },

    #[error("Unsupported image '{name}': only .jpg, .jpeg and .png files are accepted")]
    UnsupportedImage { name: String },

    #[error("Invalid colour '{0}': expected #rrggbb")]
    InvalidColor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
