//! Turning command-line arguments into job inputs.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use rankgraph_core::types::ImageFile;

/// Argument value meaning "read the text from stdin".
pub const STDIN_MARKER: &str = "-";

/// Resolve a text argument, reading `stdin` when it is [`STDIN_MARKER`].
///
/// Blank text is rejected before anything is submitted.
pub fn read_text(arg: &str, mut stdin: impl Read) -> anyhow::Result<String> {
    let text = if arg == STDIN_MARKER {
        let mut buf = String::new();
        stdin
            .read_to_string(&mut buf)
            .context("Failed to read text from stdin")?;
        buf
    } else {
        arg.to_string()
    };

    if text.trim().is_empty() {
        bail!("No text to analyse");
    }
    Ok(text)
}

/// Load every image, failing on the first unreadable or unsupported file.
pub fn load_images(paths: &[PathBuf]) -> anyhow::Result<Vec<ImageFile>> {
    if paths.is_empty() {
        bail!("At least one image is required");
    }
    paths
        .iter()
        .map(|path| {
            ImageFile::from_path(path)
                .with_context(|| format!("Failed to load image {}", path.display()))
        })
        .collect()
}
