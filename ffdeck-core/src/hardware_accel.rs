// ============================================================================
// ffdeck-core/src/hardware_accel.rs
// ============================================================================
//
// HARDWARE ACCELERATION: Encoder capability detection
//
// Transcoding and upscaling use the GPU H.264 encoder when this ffmpeg build
// lists it in `ffmpeg -hide_banner -encoders`, and libx264 otherwise. The
// listing is queried once and cached for the life of the process; a refresh
// has to be asked for explicitly.
//
// Detection never fails: if ffmpeg cannot be run or its output does not
// mention the encoder, the software path is used.

use std::fmt;

use log::{info, warn};
use once_cell::sync::OnceCell;

use crate::config::CoreConfig;
use crate::external::{CommandSpec, ProcessRunner, Tool};

/// Which H.264 encoder family the command builder should target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderCapability {
    /// Named hardware encoder, e.g. `h264_nvenc`.
    Hardware(String),
    Software,
}

impl EncoderCapability {
    #[must_use]
    pub fn is_hardware(&self) -> bool {
        matches!(self, EncoderCapability::Hardware(_))
    }
}

impl fmt::Display for EncoderCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderCapability::Hardware(name) => write!(f, "hardware ({name})"),
            EncoderCapability::Software => f.write_str("software (libx264)"),
        }
    }
}

/// Whether the `ffmpeg -encoders` listing names `encoder`.
///
/// Listing rows look like ` V....D h264_nvenc   NVIDIA NVENC H.264 encoder`,
/// so the name is matched as a whole whitespace-separated token.
#[must_use]
pub fn encoder_listed(listing: &str, encoder: &str) -> bool {
    listing
        .lines()
        .any(|line| line.split_whitespace().any(|token| token == encoder))
}

/// Queries ffmpeg for the configured hardware encoder.
pub fn detect_encoder_capability<R: ProcessRunner + ?Sized>(
    runner: &R,
    config: &CoreConfig,
) -> EncoderCapability {
    let spec = CommandSpec::new(Tool::Ffmpeg, config.program(Tool::Ffmpeg))
        .args(["-hide_banner", "-encoders"]);

    match runner.run_quiet(&spec) {
        Ok(output) if encoder_listed(&output.combined, &config.hardware_encoder) => {
            info!("Hardware encoder {} available", config.hardware_encoder);
            EncoderCapability::Hardware(config.hardware_encoder.clone())
        }
        Ok(_) => {
            info!(
                "Hardware encoder {} not listed; using libx264",
                config.hardware_encoder
            );
            EncoderCapability::Software
        }
        Err(e) => {
            warn!("Encoder detection failed, using libx264: {}", e);
            EncoderCapability::Software
        }
    }
}

/// Process-wide cache of the detected capability.
#[derive(Debug, Default)]
pub struct CapabilityCache {
    cell: OnceCell<EncoderCapability>,
}

impl CapabilityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached capability, detecting it on first use.
    pub fn get_or_detect<R: ProcessRunner + ?Sized>(
        &self,
        runner: &R,
        config: &CoreConfig,
    ) -> EncoderCapability {
        self.cell
            .get_or_init(|| detect_encoder_capability(runner, config))
            .clone()
    }

    /// Discards the cached value and detects again.
    pub fn refresh<R: ProcessRunner + ?Sized>(
        &mut self,
        runner: &R,
        config: &CoreConfig,
    ) -> EncoderCapability {
        self.cell.take();
        self.get_or_detect(runner, config)
    }
}
