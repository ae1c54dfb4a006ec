// ffdeck-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use ffdeck_core::{FrameRatePreset, ResolutionPreset};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "ffdeck: small media utilities on top of ffmpeg",
    long_about = "Probes a source video, extracts and replaces its audio, transcodes for upload, \
                  upscales and compresses audio tracks by driving ffmpeg and ffprobe."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Session file that remembers the selected source video
    #[arg(long, global = true, value_name = "PATH", env = "FFDECK_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// ffmpeg executable (defaults to `ffmpeg` on PATH)
    #[arg(long, global = true, value_name = "PATH", env = "FFDECK_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// ffprobe executable (defaults to `ffprobe` on PATH)
    #[arg(long, global = true, value_name = "PATH", env = "FFDECK_FFPROBE")]
    pub ffprobe: Option<PathBuf>,

    /// Show debug logging and the raw tool output
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Also write a detailed log to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true, default_value_t = false)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probes a video and makes it the session's source
    Probe(ProbeArgs),

    /// Extracts the source's audio to output_audio.wav next to it
    ExtractAudio,

    /// Replaces the source's audio track
    ReplaceAudio(ReplaceAudioArgs),

    /// Transcodes a video to H.264/AAC MP4 for upload
    Transcode(TranscodeArgs),

    /// Upscales a video to a preset resolution and/or frame rate
    Upscale(UpscaleArgs),

    /// Re-encodes a video's audio track to MP3, copying the video
    CompressAudio(CompressAudioArgs),

    /// Shows the current session
    Status,

    /// Reports tool availability and the encoder that will be used
    Capabilities(CapabilitiesArgs),
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Video file to select
    #[arg(value_name = "VIDEO")]
    pub video: PathBuf,
}

#[derive(Args, Debug)]
pub struct ReplaceAudioArgs {
    /// Replacement audio (defaults to the previously extracted audio)
    #[arg(value_name = "AUDIO")]
    pub audio: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TranscodeArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (defaults to <stem>_converted.mp4 next to the input)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct UpscaleArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Target resolution: Source, 720p, 1080p, 1440p or 4k
    #[arg(long, value_name = "PRESET", default_value = "Source")]
    pub resolution: ResolutionPreset,

    /// Target frame rate: Source, 30fps or 60fps
    #[arg(long, value_name = "PRESET", default_value = "Source")]
    pub fps: FrameRatePreset,

    /// Output file (defaults to <stem>_upscaled_<resolution>_<fps>.<ext>)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CompressAudioArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (defaults to <stem>_mp3.<ext> next to the input)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CapabilitiesArgs {
    /// Discard the cached encoder result and detect again. Every `ffdeck`
    /// run starts with an empty cache, so this only changes the result for
    /// programs that keep one controller alive across operations.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}
