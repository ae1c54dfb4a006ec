// ============================================================================
// ffdeck-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Fluent construction of CoreConfig
//
// Every field is optional; anything left unset falls back to the defaults
// defined in `config/mod.rs`.

use std::path::PathBuf;

use super::CoreConfig;

/// Builder for `CoreConfig`.
///
/// ```rust
/// use ffdeck_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .ffmpeg_path(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
///     .state_file(PathBuf::from("/tmp/session.json"))
///     .build();
/// assert_eq!(config.hardware_encoder, "h264_nvenc");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.config.ffmpeg_path = path;
        self
    }

    #[must_use]
    pub fn ffprobe_path(mut self, path: PathBuf) -> Self {
        self.config.ffprobe_path = path;
        self
    }

    #[must_use]
    pub fn state_file(mut self, path: PathBuf) -> Self {
        self.config.state_file = path;
        self
    }

    #[must_use]
    pub fn hardware_encoder(mut self, encoder: impl Into<String>) -> Self {
        self.config.hardware_encoder = encoder.into();
        self
    }

    /// Limits applied to the output tail reported for a failed tool run.
    #[must_use]
    pub fn diagnostic_tail(mut self, lines: usize, chars: usize) -> Self {
        self.config.diagnostic_tail_lines = lines;
        self.config.diagnostic_tail_chars = chars;
        self
    }

    #[must_use]
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
