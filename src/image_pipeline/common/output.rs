//! All-or-nothing output files.
//!
//! Products are encoded into a temporary file that lives in the destination
//! directory and is renamed over the destination only once encoding succeeded,
//! so a failed run never leaves a truncated image behind.

use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};

fn output_error(path: &Path, e: impl Display) -> PipelineError {
    PipelineError::OutputWriteError(format!("{}: {}", path.display(), e))
}

/// Runs `encode` against a temporary file next to `path`, then atomically
/// moves the result into place.
pub fn write_atomically<F>(path: &Path, encode: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staging = NamedTempFile::new_in(dir).map_err(|e| output_error(path, e))?;

    encode(&mut staging).map_err(|e| match e {
        PipelineError::IoError(io) => output_error(path, io),
        other => other,
    })?;
    staging.flush().map_err(|e| output_error(path, e))?;

    staging
        .persist(path)
        .map_err(|e| output_error(path, e.error))?;

    debug!(path = %path.display(), "Output committed");
    Ok(())
}
