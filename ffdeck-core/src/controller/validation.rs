//! Precondition checks run before any process is started.

use std::fs;
use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::utils::same_file;

/// ffmpeg receives paths as UTF-8 arguments; anything else would reach it
/// mangled.
pub(crate) fn require_utf8_path(path: &Path, what: &str) -> CoreResult<()> {
    if path.to_str().is_some() {
        Ok(())
    } else {
        Err(CoreError::PreconditionFailed(format!(
            "{what} path is not valid UTF-8: {}",
            path.display()
        )))
    }
}

/// `path` must exist, be a regular file and have a UTF-8 name.
pub(crate) fn require_existing_file(path: &Path, what: &str) -> CoreResult<()> {
    if path.is_file() {
        require_utf8_path(path, what)
    } else {
        Err(CoreError::PreconditionFailed(format!(
            "{what} does not exist: {}",
            path.display()
        )))
    }
}

/// The output must not overwrite an input.
pub(crate) fn require_distinct_output(input: &Path, output: &Path) -> CoreResult<()> {
    require_utf8_path(output, "Output")?;
    if same_file(input, output) {
        Err(CoreError::PreconditionFailed(format!(
            "Output {} would overwrite its input",
            output.display()
        )))
    } else {
        Ok(())
    }
}

/// Creates the output's parent directory when it does not exist yet.
pub(crate) fn ensure_output_dir(output: &Path) -> CoreResult<()> {
    let Some(dir) = output.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| {
        CoreError::PreconditionFailed(format!(
            "Cannot create output directory {}: {e}",
            dir.display()
        ))
    })
}
