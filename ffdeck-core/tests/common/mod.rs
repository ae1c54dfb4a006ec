// ffdeck-core/tests/common/mod.rs
//
// Shared helpers for the integration tests: a runner whose answers come
// from a closure over the received command, and ffprobe JSON fixtures.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use ffdeck_core::error::{CoreError, CoreResult};
use ffdeck_core::external::OutputStream;
use ffdeck_core::{CommandSpec, ProcessOutput, ProcessRunner, RunnerEvent, Tool};

/// How the scripted process behaves.
pub enum Reply {
    Stdout(String),
    StderrLines(Vec<String>),
    Exit(i32, String),
    NotFound,
}

type Script = dyn Fn(&CommandSpec) -> Reply + Send + Sync;

pub struct ScriptedRunner {
    script: Box<Script>,
    calls: Arc<Mutex<Vec<CommandSpec>>>,
}

impl ScriptedRunner {
    pub fn new(script: impl Fn(&CommandSpec) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ffmpeg_calls(&self) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|spec| spec.tool() == Tool::Ffmpeg)
            .collect()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(
        &self,
        spec: &CommandSpec,
        on_event: &mut dyn FnMut(RunnerEvent),
    ) -> CoreResult<ProcessOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        match (self.script)(spec) {
            Reply::Stdout(stdout) => Ok(ProcessOutput {
                exit_code: 0,
                combined: stdout.clone(),
                stdout,
                stderr: String::new(),
            }),
            Reply::StderrLines(lines) => {
                for line in &lines {
                    on_event(RunnerEvent::Line {
                        stream: OutputStream::Stderr,
                        text: line.clone(),
                    });
                }
                let stderr = lines.join("\n");
                Ok(ProcessOutput {
                    exit_code: 0,
                    stdout: String::new(),
                    combined: stderr.clone(),
                    stderr,
                })
            }
            Reply::Exit(code, output) => Err(CoreError::ProcessFailed {
                tool: spec.tool().name().to_string(),
                code: Some(code),
                diagnostics: output,
            }),
            Reply::NotFound => Err(CoreError::ExecutableNotFound(
                spec.program().display().to_string(),
            )),
        }
    }
}

/// Whether `spec` is the full JSON probe.
pub fn is_json_probe(spec: &CommandSpec) -> bool {
    spec.tool() == Tool::Ffprobe && spec.has_arg("-show_streams")
}

/// Whether `spec` is the scalar audio codec query.
pub fn is_audio_codec_query(spec: &CommandSpec) -> bool {
    spec.tool() == Tool::Ffprobe && spec.arg_value("-show_entries") == Some("stream=codec_name")
}

/// Whether `spec` is the encoder listing query.
pub fn is_encoder_query(spec: &CommandSpec) -> bool {
    spec.tool() == Tool::Ffmpeg && spec.has_arg("-encoders")
}

/// Minimal ffprobe JSON for a file with one video and optionally one audio
/// stream.
pub fn probe_json(
    video_codec: &str,
    audio_codec: Option<&str>,
    format_name: &str,
    (width, height): (u32, u32),
    frame_rate: &str,
) -> String {
    let mut streams = vec![format!(
        r#"{{"codec_type": "video", "codec_name": "{video_codec}", "width": {width}, "height": {height}, "avg_frame_rate": "{frame_rate}", "r_frame_rate": "{frame_rate}"}}"#
    )];
    if let Some(audio) = audio_codec {
        streams.push(format!(r#"{{"codec_type": "audio", "codec_name": "{audio}"}}"#));
    }
    format!(
        r#"{{"streams": [{}], "format": {{"format_name": "{format_name}", "start_time": "0.000000", "duration": "10.0"}}}}"#,
        streams.join(", ")
    )
}

/// Creates an empty placeholder file.
pub fn touch(path: &Path) {
    std::fs::write(path, b"").unwrap();
}
