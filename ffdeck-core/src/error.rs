// ============================================================================
// ffdeck-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom error types for the ffdeck-core library
//
// Every fallible operation in the core returns `CoreResult<T>`. The variants
// mirror the ways an operation can go wrong: a tool is missing, a tool ran
// and failed, a file has no usable streams, the session is not in a state
// that allows the request, or a plain I/O or JSON problem.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Required executable '{0}' not found")]
    ExecutableNotFound(String),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("{tool} failed ({}):\n{diagnostics}", exit_label(.code))]
    ProcessFailed {
        tool: String,
        code: Option<i32>,
        diagnostics: String,
    },

    #[error("No video stream found in {}", .0.display())]
    NoVideoStream(PathBuf),

    #[error("Failed to parse ffprobe output: {0}")]
    ProbeParse(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    OperationFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type used throughout the core library.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

pub(crate) fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Maps a spawn failure to the matching error, separating "not installed"
/// from every other reason a process can fail to start.
pub fn command_start_error(program: impl Into<String>, err: io::Error) -> CoreError {
    let program = program.into();
    if err.kind() == io::ErrorKind::NotFound {
        CoreError::ExecutableNotFound(program)
    } else {
        CoreError::CommandStart(program, err)
    }
}

/// Builds the error for a tool that ran and exited unsuccessfully.
pub fn command_failed_error(
    tool: impl Into<String>,
    code: Option<i32>,
    diagnostics: impl Into<String>,
) -> CoreError {
    CoreError::ProcessFailed {
        tool: tool.into(),
        code,
        diagnostics: diagnostics.into(),
    }
}
