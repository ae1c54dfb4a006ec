// ============================================================================
// ffdeck-core/src/command/mod.rs
// ============================================================================
//
// COMMAND BUILDER: ffmpeg argument lists for every operation
//
// `CommandBuilder::build` is a pure function of the operation, the session
// and the user's options. It touches neither the file system nor any
// process, which keeps every argument list unit-testable.
//
// All ffmpeg invocations start with `-hide_banner -y`: ffdeck always
// overwrites its own outputs. Long-running encodes add `-stats` so the
// status line keeps printing even when the log level is lowered.

use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{CommandSpec, Tool};
use crate::hardware_accel::EncoderCapability;
use crate::session::SessionState;
use crate::utils::format_rate;

pub mod output_path;
pub mod profiles;

pub use profiles::{FrameRatePreset, ResolutionPreset, UnknownPreset, extension_for_container};

use profiles::{
    FALLBACK_AUDIO_BITRATE, FALLBACK_AUDIO_CODEC, FRAME_RATE_TOLERANCE, MP3_ENCODER,
    MP3_VBR_QUALITY, PCM_CHANNELS, PCM_CODEC, PCM_SAMPLE_RATE, UPLOAD_AUDIO_BITRATE,
    UPLOAD_AUDIO_CODEC, UPLOAD_PIXEL_FORMAT, upload_video_args, upscale_video_args,
};

/// Resolution and frame rate of an upscale input, as probed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceGeometry {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// One ffmpeg invocation the builder knows how to describe.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Session source to uncompressed stereo PCM next to it.
    ExtractAudio,
    /// Session source's video with the audio of `replacement`.
    ReplaceAudio { replacement: PathBuf },
    TranscodeForUpload {
        input: PathBuf,
        output: Option<PathBuf>,
    },
    Upscale {
        input: PathBuf,
        output: Option<PathBuf>,
        source: SourceGeometry,
        resolution: ResolutionPreset,
        frame_rate: FrameRatePreset,
    },
    /// Any input to a PCM WAV at an explicit path.
    ExtractPcm { input: PathBuf, output: PathBuf },
    /// Audio file to VBR MP3.
    EncodeMp3 { input: PathBuf, output: PathBuf },
    /// Video of `video` with the audio of `audio`, both stream-copied.
    MuxAudio {
        video: PathBuf,
        audio: PathBuf,
        output: PathBuf,
    },
}

/// Per-run choices that are not part of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct UserOptions {
    pub encoder: EncoderCapability,
    /// Overrides the session's audio codec when replacing audio.
    pub audio_codec: Option<String>,
}

impl Default for UserOptions {
    fn default() -> Self {
        Self {
            encoder: EncoderCapability::Software,
            audio_codec: None,
        }
    }
}

/// Audio codec used when replacing audio: the explicit override, else the
/// source's codec, else the fallback.
#[must_use]
pub fn replacement_audio_codec(session: &SessionState, options: &UserOptions) -> String {
    options
        .audio_codec
        .clone()
        .or_else(|| session.audio_codec.clone())
        .filter(|codec| !codec.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_AUDIO_CODEC.to_string())
}

/// Whether scaling to `target` is an enlargement in both dimensions.
#[must_use]
pub fn is_enlargement(source: &SourceGeometry, target: (u32, u32)) -> bool {
    target.0 > source.width && target.1 > source.height
}

/// Whether `target` differs from the source rate by more than the tolerance.
#[must_use]
pub fn frame_rate_differs(source: &SourceGeometry, target: f64) -> bool {
    (target - source.frame_rate).abs() > FRAME_RATE_TOLERANCE
}

/// Builds `CommandSpec`s from the configured tool paths.
pub struct CommandBuilder<'a> {
    config: &'a CoreConfig,
}

impl<'a> CommandBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a CoreConfig) -> Self {
        Self { config }
    }

    fn ffmpeg(&self) -> CommandSpec {
        CommandSpec::new(Tool::Ffmpeg, self.config.program(Tool::Ffmpeg))
            .args(["-hide_banner", "-y"])
    }

    /// Describes `operation`. Session-based operations fail with
    /// `InvalidState` when no session is given.
    pub fn build(
        &self,
        operation: &Operation,
        session: Option<&SessionState>,
        options: &UserOptions,
    ) -> CoreResult<CommandSpec> {
        match operation {
            Operation::ExtractAudio => {
                let session = require_session(session)?;
                Ok(self.pcm_extract(
                    &session.source_path,
                    &output_path::extracted_audio_path(&session.source_path),
                ))
            }
            Operation::ReplaceAudio { replacement } => {
                let session = require_session(session)?;
                Ok(self.replace_audio(session, replacement, options))
            }
            Operation::TranscodeForUpload { input, output } => {
                let output = output
                    .clone()
                    .unwrap_or_else(|| output_path::converted_path(input));
                Ok(self.transcode(input, &output, &options.encoder))
            }
            Operation::Upscale {
                input,
                output,
                source,
                resolution,
                frame_rate,
            } => {
                let output = output
                    .clone()
                    .unwrap_or_else(|| output_path::upscaled_path(input, *resolution, *frame_rate));
                Ok(self.upscale(input, &output, source, *resolution, *frame_rate, &options.encoder))
            }
            Operation::ExtractPcm { input, output } => Ok(self.pcm_extract(input, output)),
            Operation::EncodeMp3 { input, output } => Ok(self
                .ffmpeg()
                .arg("-i")
                .path_arg(input)
                .args(["-vn", "-acodec", MP3_ENCODER, "-q:a", MP3_VBR_QUALITY])
                .output(output)),
            Operation::MuxAudio {
                video,
                audio,
                output,
            } => Ok(self
                .ffmpeg()
                .arg("-i")
                .path_arg(video)
                .arg("-i")
                .path_arg(audio)
                .args([
                    "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "copy", "-shortest",
                ])
                .output(output)),
        }
    }

    fn pcm_extract(&self, input: &Path, output: &Path) -> CommandSpec {
        self.ffmpeg()
            .arg("-i")
            .path_arg(input)
            .args([
                "-vn",
                "-acodec",
                PCM_CODEC,
                "-ar",
                PCM_SAMPLE_RATE,
                "-ac",
                PCM_CHANNELS,
            ])
            .output(output)
    }

    fn replace_audio(
        &self,
        session: &SessionState,
        replacement: &Path,
        options: &UserOptions,
    ) -> CommandSpec {
        let codec = replacement_audio_codec(session, options);
        let mut spec = self
            .ffmpeg()
            .arg("-i")
            .path_arg(&session.source_path)
            .arg("-i")
            .path_arg(replacement)
            .args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a"])
            .arg(codec.as_str());
        if codec == FALLBACK_AUDIO_CODEC {
            spec = spec.args(["-b:a", FALLBACK_AUDIO_BITRATE]);
        }
        spec.arg("-shortest").output(&output_path::replaced_audio_path(
            &session.source_path,
            &session.container_format,
        ))
    }

    fn transcode(&self, input: &Path, output: &Path, encoder: &EncoderCapability) -> CommandSpec {
        self.ffmpeg()
            .arg("-stats")
            .arg("-i")
            .path_arg(input)
            .args(["-map", "0:v:0", "-map", "0:a:0?"])
            .args(upload_video_args(encoder))
            .args([
                "-c:a",
                UPLOAD_AUDIO_CODEC,
                "-b:a",
                UPLOAD_AUDIO_BITRATE,
                "-pix_fmt",
                UPLOAD_PIXEL_FORMAT,
            ])
            .output(output)
    }

    fn upscale(
        &self,
        input: &Path,
        output: &Path,
        source: &SourceGeometry,
        resolution: ResolutionPreset,
        frame_rate: FrameRatePreset,
        encoder: &EncoderCapability,
    ) -> CommandSpec {
        let mut spec = self.ffmpeg().arg("-stats").arg("-i").path_arg(input);

        if let Some((width, height)) = resolution
            .dimensions()
            .filter(|target| is_enlargement(source, *target))
        {
            spec = spec.args(["-vf".to_string(), format!("scale={width}:{height}")]);
        }
        if let Some(rate) = frame_rate
            .rate()
            .filter(|rate| frame_rate_differs(source, *rate))
        {
            spec = spec.args(["-r".to_string(), format_rate(rate)]);
        }

        spec.args(upscale_video_args(encoder))
            .args(["-c:a", "copy"])
            .output(output)
    }
}

fn require_session(session: Option<&SessionState>) -> CoreResult<&SessionState> {
    session.ok_or_else(|| {
        CoreError::InvalidState(
            "No source video selected; run a probe on the source first".to_string(),
        )
    })
}
