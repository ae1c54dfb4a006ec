//! Default output file names.
//!
//! Every operation writes next to its input unless the caller chooses a
//! path. Names are derived from the input stem so repeated runs overwrite
//! the previous result instead of piling up copies.

use std::path::{Path, PathBuf};

use super::profiles::{
    DEFAULT_EXTENSION, EXTRACTED_AUDIO_FILE, FrameRatePreset, ResolutionPreset,
    extension_for_container,
};

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

fn extension_or_default(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn sibling(path: &Path, file_name: String) -> PathBuf {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// `<source dir>/output_audio.wav`
#[must_use]
pub fn extracted_audio_path(source: &Path) -> PathBuf {
    sibling(source, EXTRACTED_AUDIO_FILE.to_string())
}

/// `<source dir>/<stem>_newaudio.<ext for container>`
#[must_use]
pub fn replaced_audio_path(source: &Path, container_format: &str) -> PathBuf {
    sibling(
        source,
        format!(
            "{}_newaudio.{}",
            stem(source),
            extension_for_container(container_format)
        ),
    )
}

/// `<input dir>/<stem>_converted.mp4`
#[must_use]
pub fn converted_path(input: &Path) -> PathBuf {
    sibling(input, format!("{}_converted.mp4", stem(input)))
}

/// `<input dir>/<stem>_upscaled_<resolution>_<fps>.<ext>`
#[must_use]
pub fn upscaled_path(
    input: &Path,
    resolution: ResolutionPreset,
    frame_rate: FrameRatePreset,
) -> PathBuf {
    sibling(
        input,
        format!(
            "{}_upscaled_{}_{}.{}",
            stem(input),
            resolution.label(),
            frame_rate.label(),
            extension_or_default(input)
        ),
    )
}

/// `<input dir>/<stem>_mp3.<ext>`
#[must_use]
pub fn compressed_audio_path(input: &Path) -> PathBuf {
    sibling(
        input,
        format!("{}_mp3.{}", stem(input), extension_or_default(input)),
    )
}
