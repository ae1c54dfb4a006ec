// ============================================================================
// ffdeck-core/src/config/mod.rs
// ============================================================================
//
// CONFIGURATION: Runtime settings for the core library
//
// `CoreConfig` carries the locations of the external tools, the session
// file and the tunables for failure reporting. The CLI fills it from flags
// and environment variables through `CoreConfigBuilder`.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::external::Tool;

mod builder;

pub use builder::CoreConfigBuilder;

/// Program name used to locate ffmpeg when no explicit path is configured.
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

/// Program name used to locate ffprobe when no explicit path is configured.
pub const DEFAULT_FFPROBE_PATH: &str = "ffprobe";

/// Session file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = "ffdeck_session.json";

/// Hardware H.264 encoder looked for in `ffmpeg -encoders`.
pub const DEFAULT_HARDWARE_ENCODER: &str = "h264_nvenc";

/// Number of trailing output lines kept when a tool fails.
pub const DEFAULT_DIAGNOSTIC_TAIL_LINES: usize = 10;

/// Character cap applied to the kept tail.
pub const DEFAULT_DIAGNOSTIC_TAIL_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub state_file: PathBuf,
    pub hardware_encoder: String,
    pub diagnostic_tail_lines: usize,
    pub diagnostic_tail_chars: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
            ffprobe_path: PathBuf::from(DEFAULT_FFPROBE_PATH),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            hardware_encoder: DEFAULT_HARDWARE_ENCODER.to_string(),
            diagnostic_tail_lines: DEFAULT_DIAGNOSTIC_TAIL_LINES,
            diagnostic_tail_chars: DEFAULT_DIAGNOSTIC_TAIL_CHARS,
        }
    }
}

impl CoreConfig {
    /// Path (or bare program name) used to launch `tool`.
    #[must_use]
    pub fn program(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Ffmpeg => &self.ffmpeg_path,
            Tool::Ffprobe => &self.ffprobe_path,
        }
    }

    /// Rejects settings no operation could run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(CoreError::Config("ffmpeg path must not be empty".to_string()));
        }
        if self.ffprobe_path.as_os_str().is_empty() {
            return Err(CoreError::Config("ffprobe path must not be empty".to_string()));
        }
        if self.state_file.file_name().is_none() {
            return Err(CoreError::Config(format!(
                "State file '{}' does not name a file",
                self.state_file.display()
            )));
        }
        if self.hardware_encoder.trim().is_empty() {
            return Err(CoreError::Config(
                "Hardware encoder name must not be empty".to_string(),
            ));
        }
        if self.diagnostic_tail_lines == 0 || self.diagnostic_tail_chars == 0 {
            return Err(CoreError::Config(
                "Diagnostic tail limits must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
