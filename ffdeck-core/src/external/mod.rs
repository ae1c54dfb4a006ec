// ============================================================================
// ffdeck-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Launching ffmpeg and ffprobe
//
// This module owns every interaction with the external executables. Commands
// are described by an immutable `CommandSpec`, executed by a `ProcessRunner`,
// and their output is streamed back line by line as `RunnerEvent`s.
//
// KEY COMPONENTS:
// - `Tool` / `CommandSpec`: what to run
// - `ProcessRunner`: the injectable execution seam (`SystemRunner` in production)
// - `check_dependency` / `ToolAvailability`: startup detection of the tools
//
// DESIGN PHILOSOPHY:
// Callers never build `std::process::Command` themselves. Going through the
// trait keeps the controller testable with a scripted runner.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult, command_start_error};

mod runner;

#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

pub use runner::{SystemRunner, split_output_lines};

// ============================================================================
// COMMAND DESCRIPTION
// ============================================================================

/// The external executables ffdeck drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

impl Tool {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered argument list for one tool invocation.
///
/// Built once with the consuming builder methods and never mutated after it
/// is handed to a runner. When the invocation writes a file, the path is
/// both the last argument and recorded in `output_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    tool: Tool,
    program: PathBuf,
    args: Vec<String>,
    output_path: Option<PathBuf>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(tool: Tool, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
            output_path: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends a path argument.
    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Appends the output file as the final argument and records it.
    #[must_use]
    pub fn output(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self.output_path = Some(path.to_path_buf());
        self
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    #[must_use]
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Value following the first occurrence of `flag`, e.g. `-c:a`.
    #[must_use]
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Shell-style rendering used for logs and error messages.
    #[must_use]
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .map(|part| quote_for_display(&part))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_for_display(part: &str) -> String {
    if part.is_empty() {
        return "''".to_string();
    }
    if part
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '&' | ';' | '|' | '(' | ')' | '$'))
    {
        format!("'{}'", part.replace('\'', r"'\''"))
    } else {
        part.to_string()
    }
}

// ============================================================================
// EXECUTION RESULTS
// ============================================================================

/// Which pipe a line of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A parsed ffmpeg status line (`frame= ... time= ... speed=`).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub frame: u32,
    pub fps: f32,
    pub time: String,
    pub bitrate_kbps: f32,
    pub speed: f32,
}

impl From<ffmpeg_sidecar::event::FfmpegProgress> for ProgressUpdate {
    fn from(progress: ffmpeg_sidecar::event::FfmpegProgress) -> Self {
        Self {
            frame: progress.frame,
            fps: progress.fps,
            time: progress.time,
            bitrate_kbps: progress.bitrate_kbps,
            speed: progress.speed,
        }
    }
}

/// Streamed while a process runs, in the order the lines were produced on
/// each pipe.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent {
    Line { stream: OutputStream, text: String },
    Progress(ProgressUpdate),
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Both streams interleaved in arrival order.
    pub combined: String,
}

// ============================================================================
// RUNNER TRAIT
// ============================================================================

/// Executes a `CommandSpec` and reports its output.
///
/// Implementations must stream every line to `on_event` before returning,
/// return `ExecutableNotFound` when the program cannot be located and
/// `ProcessFailed` (carrying the combined output) on a non-zero exit.
pub trait ProcessRunner: Send + Sync {
    fn run(
        &self,
        spec: &CommandSpec,
        on_event: &mut dyn FnMut(RunnerEvent),
    ) -> CoreResult<ProcessOutput>;

    /// Runs without observing the streamed events.
    fn run_quiet(&self, spec: &CommandSpec) -> CoreResult<ProcessOutput> {
        self.run(spec, &mut |_| {})
    }
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Verifies that `program` can be launched by running it with `-version`.
///
/// Only a failure to start counts against the tool; the exit status of the
/// version query is ignored.
pub fn check_dependency(tool: Tool, program: &Path) -> CoreResult<()> {
    let result = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found {} at {}", tool, program.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found at {}", tool, program.display());
            Err(CoreError::ExecutableNotFound(format!(
                "{} ({})",
                tool,
                program.display()
            )))
        }
        Err(e) => {
            log::error!("Failed to start dependency check for '{}': {}", tool, e);
            Err(command_start_error(program.display().to_string(), e))
        }
    }
}

/// Which of the external tools could be launched at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolAvailability {
    pub ffmpeg: bool,
    pub ffprobe: bool,
}

impl ToolAvailability {
    /// Probes both configured tools.
    #[must_use]
    pub fn detect(config: &CoreConfig) -> Self {
        Self {
            ffmpeg: check_dependency(Tool::Ffmpeg, &config.ffmpeg_path).is_ok(),
            ffprobe: check_dependency(Tool::Ffprobe, &config.ffprobe_path).is_ok(),
        }
    }

    #[must_use]
    pub fn all() -> Self {
        Self {
            ffmpeg: true,
            ffprobe: true,
        }
    }

    #[must_use]
    pub fn is_available(&self, tool: Tool) -> bool {
        match tool {
            Tool::Ffmpeg => self.ffmpeg,
            Tool::Ffprobe => self.ffprobe,
        }
    }

    #[must_use]
    pub fn missing(&self) -> Vec<Tool> {
        [Tool::Ffmpeg, Tool::Ffprobe]
            .into_iter()
            .filter(|tool| !self.is_available(*tool))
            .collect()
    }
}
