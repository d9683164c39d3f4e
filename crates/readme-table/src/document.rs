use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Markdown source of the README, read once and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    source: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Document {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Reads `path` as UTF-8. Invalid UTF-8 surfaces as an I/O error.
pub fn read_document(path: &Path) -> PipelineResult<Document> {
    let source = fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = source.len(), "read markdown document");
    Ok(Document::new(path, source))
}
