// ============================================================================
// ffdeck-core/src/session.rs
// ============================================================================
//
// SESSION STATE: The selected source video and what is known about it
//
// Selecting a source writes a fresh `SessionState`; later operations
// (audio extraction and replacement) read it back. The state lives in a
// small JSON file so it survives between invocations:
//
//   {
//     "sourcePath": "/videos/clip.mp4",
//     "videoCodec": "h264",
//     "audioCodec": "aac",
//     "containerFormat": "mov",
//     "startTimeOffsetSeconds": 0.0,
//     "extractedAudioPath": null
//   }
//
// Every key is always written. Saves go through a temporary file in the same
// directory followed by a rename, so a reader never sees a half-written file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{CoreError, CoreResult};
use crate::media::ProbeResult;

/// Facts about the currently selected source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub source_path: PathBuf,
    #[serde(default)]
    pub video_codec: String,
    #[serde(default)]
    pub audio_codec: Option<String>,
    #[serde(default)]
    pub container_format: String,
    #[serde(default)]
    pub start_time_offset_seconds: f64,
    #[serde(default)]
    pub extracted_audio_path: Option<PathBuf>,
}

impl SessionState {
    /// Fresh session for a just-probed source. Any previously extracted
    /// audio belongs to the old source and is not carried over.
    #[must_use]
    pub fn from_probe(probe: &ProbeResult) -> Self {
        Self {
            source_path: probe.path.clone(),
            video_codec: probe.video_codec.clone(),
            audio_codec: probe.audio_codec.clone(),
            container_format: probe.container_format.clone(),
            start_time_offset_seconds: probe.start_time_secs,
            extracted_audio_path: None,
        }
    }
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored session. A missing, unreadable or corrupt file is
    /// treated as "no session"; the latter two are logged.
    #[must_use]
    pub fn load(&self) -> Option<SessionState> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No session file at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Could not read session file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(
                    "Ignoring corrupt session file {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Like `load`, but a missing session is an error.
    pub fn load_required(&self) -> CoreResult<SessionState> {
        self.load().ok_or_else(|| {
            CoreError::InvalidState(
                "No source video selected; run a probe on the source first".to_string(),
            )
        })
    }

    /// Atomically replaces the session file with `state`.
    pub fn save(&self, state: &SessionState) -> CoreResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, state)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| CoreError::Io(e.error))?;

        debug!("Saved session to {}", self.path.display());
        Ok(())
    }
}
