use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Truncates `path` and writes `contents`. The handle is closed on return,
/// including when a write fails part way through.
pub fn write_page(path: &Path, contents: &str) -> PipelineResult<()> {
    let write_err = |source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(write_err)?;
    file.write_all(contents.as_bytes()).map_err(write_err)?;
    file.flush().map_err(write_err)?;

    debug!(path = %path.display(), bytes = contents.len(), "wrote page");
    Ok(())
}
