// ============================================================================
// ffdeck-core/src/command/profiles.rs
// ============================================================================
//
// ENCODING PROFILES: Fixed parameters and user-selectable presets
//
// The numbers here are the contract with ffmpeg; changing one changes the
// produced files.

use std::fmt;
use std::str::FromStr;

use crate::hardware_accel::EncoderCapability;

// ---- Audio extraction (uncompressed PCM) ----
pub const PCM_CODEC: &str = "pcm_s16le";
pub const PCM_SAMPLE_RATE: &str = "44100";
pub const PCM_CHANNELS: &str = "2";
pub const EXTRACTED_AUDIO_FILE: &str = "output_audio.wav";

// ---- Audio replacement ----
/// Codec used when the source's own audio codec is rejected by the muxer.
pub const FALLBACK_AUDIO_CODEC: &str = "aac";
pub const FALLBACK_AUDIO_BITRATE: &str = "192k";

// ---- Upload transcode ----
pub const SOFTWARE_ENCODER: &str = "libx264";
pub const UPLOAD_AUDIO_CODEC: &str = "aac";
pub const UPLOAD_AUDIO_BITRATE: &str = "320k";
pub const UPLOAD_PIXEL_FORMAT: &str = "yuv420p";
pub const QUALITY: &str = "23";

// ---- MP3 compression ----
pub const MP3_ENCODER: &str = "libmp3lame";
pub const MP3_VBR_QUALITY: &str = "2";

/// Container assumed when the source's format is unknown.
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Frame rate differences at or below this are treated as equal.
pub const FRAME_RATE_TOLERANCE: f64 = 0.01;

const CONTAINER_EXTENSIONS: &[(&str, &str)] = &[
    ("matroska", "mkv"),
    ("webm", "webm"),
    ("mov", "mp4"),
    ("mp4", "mp4"),
    ("avi", "avi"),
    ("flv", "flv"),
    ("asf", "wmv"),
    ("mpegts", "ts"),
    ("ogg", "ogv"),
];

/// File extension for an ffprobe container name. Only the first entry of a
/// comma-separated name is considered; unknown containers map to `mp4`.
#[must_use]
pub fn extension_for_container(container: &str) -> &'static str {
    let primary = crate::utils::primary_format(container);
    CONTAINER_EXTENSIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(primary))
        .map(|(_, ext)| *ext)
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Video encoder arguments for the upload transcode.
#[must_use]
pub fn upload_video_args(capability: &EncoderCapability) -> Vec<String> {
    let args: Vec<&str> = match capability {
        EncoderCapability::Hardware(encoder) => vec![
            "-c:v",
            encoder.as_str(),
            "-preset",
            "p6",
            "-rc",
            "vbr",
            "-cq",
            QUALITY,
            "-qmin",
            "18",
            "-qmax",
            "28",
        ],
        EncoderCapability::Software => vec![
            "-c:v",
            SOFTWARE_ENCODER,
            "-preset",
            "ultrafast",
            "-crf",
            QUALITY,
        ],
    };
    args.into_iter().map(str::to_string).collect()
}

/// Video encoder arguments for upscaling.
#[must_use]
pub fn upscale_video_args(capability: &EncoderCapability) -> Vec<String> {
    let (encoder, quality_flag) = match capability {
        EncoderCapability::Hardware(encoder) => (encoder.as_str(), "-cq"),
        EncoderCapability::Software => (SOFTWARE_ENCODER, "-crf"),
    };
    ["-c:v", encoder, "-preset", "fast", quality_flag, QUALITY]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Error for an unrecognized preset name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPreset {
    kind: &'static str,
    value: String,
    accepted: String,
}

impl fmt::Display for UnknownPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown {} '{}' (expected one of: {})",
            self.kind, self.value, self.accepted
        )
    }
}

impl std::error::Error for UnknownPreset {}

/// Target resolution for upscaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPreset {
    #[default]
    Source,
    P720,
    P1080,
    P1440,
    Uhd4k,
}

impl ResolutionPreset {
    pub const ALL: [ResolutionPreset; 5] = [
        ResolutionPreset::Source,
        ResolutionPreset::P720,
        ResolutionPreset::P1080,
        ResolutionPreset::P1440,
        ResolutionPreset::Uhd4k,
    ];

    /// Width and height, or `None` to keep the source resolution.
    #[must_use]
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            ResolutionPreset::Source => None,
            ResolutionPreset::P720 => Some((1280, 720)),
            ResolutionPreset::P1080 => Some((1920, 1080)),
            ResolutionPreset::P1440 => Some((2560, 1440)),
            ResolutionPreset::Uhd4k => Some((3840, 2160)),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ResolutionPreset::Source => "Source",
            ResolutionPreset::P720 => "720p",
            ResolutionPreset::P1080 => "1080p",
            ResolutionPreset::P1440 => "1440p",
            ResolutionPreset::Uhd4k => "4k",
        }
    }
}

impl fmt::Display for ResolutionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResolutionPreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResolutionPreset::ALL
            .into_iter()
            .find(|preset| preset.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPreset {
                kind: "resolution",
                value: s.to_string(),
                accepted: ResolutionPreset::ALL.map(ResolutionPreset::label).join(", "),
            })
    }
}

/// Target frame rate for upscaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameRatePreset {
    #[default]
    Source,
    Fps30,
    Fps60,
}

impl FrameRatePreset {
    pub const ALL: [FrameRatePreset; 3] = [
        FrameRatePreset::Source,
        FrameRatePreset::Fps30,
        FrameRatePreset::Fps60,
    ];

    #[must_use]
    pub fn rate(self) -> Option<f64> {
        match self {
            FrameRatePreset::Source => None,
            FrameRatePreset::Fps30 => Some(30.0),
            FrameRatePreset::Fps60 => Some(60.0),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FrameRatePreset::Source => "Source",
            FrameRatePreset::Fps30 => "30fps",
            FrameRatePreset::Fps60 => "60fps",
        }
    }
}

impl fmt::Display for FrameRatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FrameRatePreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FrameRatePreset::ALL
            .into_iter()
            .find(|preset| {
                preset.label().eq_ignore_ascii_case(wanted)
                    || preset
                        .label()
                        .strip_suffix("fps")
                        .is_some_and(|number| number == wanted)
            })
            .ok_or_else(|| UnknownPreset {
                kind: "frame rate",
                value: s.to_string(),
                accepted: FrameRatePreset::ALL.map(FrameRatePreset::label).join(", "),
            })
    }
}
