// ============================================================================
// ffdeck-core/src/media/probe.rs
// ============================================================================
//
// MEDIA PROBE: Stream and container properties via ffprobe
//
// The full probe runs
//   ffprobe -v quiet -print_format json -show_format -show_streams <path>
// and picks out the first video and first audio stream. Missing optional
// fields become warnings on the result instead of errors; only a file with
// no video stream at all is rejected. The caller decides how to surface
// the warnings.

use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{CommandSpec, ProcessRunner, Tool};
use crate::utils::primary_format;

/// Properties of a probed media file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub path: PathBuf,
    pub video_codec: String,
    pub audio_codec: Option<String>,
    /// First token of `format_name`, e.g. `mov` for `mov,mp4,m4a,...`.
    pub container_format: String,
    pub format_name: String,
    pub width: u32,
    pub height: u32,
    /// Frames per second; 0.0 when ffprobe reported nothing usable.
    pub frame_rate: f64,
    pub start_time_secs: f64,
    pub duration_secs: Option<f64>,
    pub warnings: Vec<String>,
}

// ---- ffprobe JSON shape (only the fields we read) ----

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    start_time: Option<String>,
    duration: Option<String>,
}

/// Runs ffprobe through the injected runner.
pub struct MediaProbe<'a, R: ProcessRunner + ?Sized> {
    runner: &'a R,
    ffprobe: &'a Path,
}

impl<'a, R: ProcessRunner + ?Sized> MediaProbe<'a, R> {
    pub fn new(runner: &'a R, config: &'a CoreConfig) -> Self {
        Self {
            runner,
            ffprobe: config.program(Tool::Ffprobe),
        }
    }

    fn ffprobe(&self) -> CommandSpec {
        CommandSpec::new(Tool::Ffprobe, self.ffprobe)
    }

    /// Probes streams and container of `path`.
    pub fn probe(&self, path: &Path) -> CoreResult<ProbeResult> {
        let spec = self
            .ffprobe()
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .path_arg(path);
        debug!("Probing {}", path.display());
        let output = self.runner.run_quiet(&spec)?;
        parse_probe_output(path, &output.stdout)
    }

    /// Queries a single value, e.g. `stream=codec_name` for the stream
    /// selected by `select_streams`. Returns `None` when ffprobe printed
    /// nothing.
    pub fn probe_scalar(
        &self,
        path: &Path,
        select_streams: Option<&str>,
        entries: &str,
    ) -> CoreResult<Option<String>> {
        let mut spec = self.ffprobe().args(["-v", "error"]);
        if let Some(selector) = select_streams {
            spec = spec.args(["-select_streams", selector]);
        }
        let spec = spec
            .args(["-show_entries", entries, "-of", "default=nw=1:nk=1"])
            .path_arg(path);
        let output = self.runner.run_quiet(&spec)?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string))
    }

    /// Codec of the first audio stream, if there is one.
    pub fn probe_audio_codec(&self, path: &Path) -> CoreResult<Option<String>> {
        self.probe_scalar(path, Some("a:0"), "stream=codec_name")
    }

    /// Container duration in seconds. `None` when ffprobe does not know it.
    pub fn probe_duration(&self, path: &Path) -> CoreResult<Option<f64>> {
        let raw = self.probe_scalar(path, None, "format=duration")?;
        Ok(raw.and_then(|value| value.parse::<f64>().ok()).filter(|d| d.is_finite()))
    }
}

/// Parses the JSON printed by the full probe.
pub fn parse_probe_output(path: &Path, json: &str) -> CoreResult<ProbeResult> {
    let parsed: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| CoreError::ProbeParse(e.to_string()))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| CoreError::NoVideoStream(path.to_path_buf()))?;
    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    let mut warnings = Vec::new();
    let mut note = |message: String| {
        debug!("{}: {}", path.display(), message);
        warnings.push(message);
    };

    let video_codec = video.codec_name.clone().unwrap_or_else(|| {
        note("Video codec name not reported".to_string());
        "unknown".to_string()
    });

    let audio_codec = match audio {
        Some(stream) => stream.codec_name.clone(),
        None => {
            note("No audio stream found".to_string());
            None
        }
    };

    let format_name = parsed.format.format_name.clone().unwrap_or_default();
    if format_name.is_empty() {
        note("Container format not reported".to_string());
    }
    let container_format = primary_format(&format_name).to_string();

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            note("Video resolution not reported".to_string());
            (0, 0)
        }
    };

    let frame_rate = parse_frame_rate(
        video.avg_frame_rate.as_deref(),
        video.r_frame_rate.as_deref(),
    );
    if frame_rate == 0.0 {
        note("Frame rate not reported".to_string());
    }

    let start_time_secs = match parsed.format.start_time.as_deref() {
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                note(format!("Unreadable start time '{raw}', using 0"));
                0.0
            }
        },
        None => {
            note("Start time not reported, using 0".to_string());
            0.0
        }
    };

    let duration_secs = parsed
        .format
        .duration
        .as_deref()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    Ok(ProbeResult {
        path: path.to_path_buf(),
        video_codec,
        audio_codec,
        container_format,
        format_name,
        width,
        height,
        frame_rate,
        start_time_secs,
        duration_secs,
        warnings,
    })
}

/// Frame rate from `avg_frame_rate`, falling back to `r_frame_rate`, then
/// to 0.0. Rationals with a zero denominator (`0/0`) count as missing.
#[must_use]
pub fn parse_frame_rate(primary: Option<&str>, fallback: Option<&str>) -> f64 {
    primary
        .and_then(parse_rational)
        .or_else(|| fallback.and_then(parse_rational))
        .unwrap_or(0.0)
}

fn parse_rational(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let value = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.parse().ok()?,
    };
    value.is_finite().then_some(value)
}
