// ============================================================================
// ffdeck-core/src/external/runner.rs
// ============================================================================
//
// SYSTEM RUNNER: ProcessRunner backed by std::process
//
// Both pipes are drained on dedicated reader threads so neither can fill up
// and stall the child. The threads forward lines over a channel, and the
// calling thread dispatches them to the event callback, so the callback
// never has to be `Send`.
//
// ffmpeg redraws its status line with carriage returns, so lines are split
// on `\r` as well as `\n`.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;

use crossbeam_channel::{Sender, unbounded};
use ffmpeg_sidecar::log_parser::try_parse_progress;
use log::{debug, trace};

use super::{CommandSpec, OutputStream, ProcessOutput, ProcessRunner, RunnerEvent, Tool};
use crate::error::{CoreResult, command_failed_error, command_start_error};

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        spec: &CommandSpec,
        on_event: &mut dyn FnMut(RunnerEvent),
    ) -> CoreResult<ProcessOutput> {
        debug!("Executing: {}", spec.display_line());

        let mut child = Command::new(spec.program())
            .args(spec.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_start_error(spec.program().display().to_string(), e))?;

        let (tx, rx) = unbounded::<(OutputStream, String)>();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || {
                pump_lines(stdout, OutputStream::Stdout, &tx);
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || {
                pump_lines(stderr, OutputStream::Stderr, &tx);
            }));
        }
        // The loop below ends once both reader threads drop their senders.
        drop(tx);

        let mut stdout_lines = Vec::new();
        let mut stderr_lines = Vec::new();
        let mut combined_lines = Vec::new();

        for (stream, text) in rx {
            trace!("{:?}: {}", stream, text);
            if spec.tool() == Tool::Ffmpeg && stream == OutputStream::Stderr {
                if let Some(progress) = try_parse_progress(&text) {
                    on_event(RunnerEvent::Progress(progress.into()));
                }
            }
            on_event(RunnerEvent::Line {
                stream,
                text: text.clone(),
            });
            match stream {
                OutputStream::Stdout => stdout_lines.push(text.clone()),
                OutputStream::Stderr => stderr_lines.push(text.clone()),
            }
            combined_lines.push(text);
        }

        for reader in readers {
            let _ = reader.join();
        }

        let status = child.wait()?;
        let output = ProcessOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout: stdout_lines.join("\n"),
            stderr: stderr_lines.join("\n"),
            combined: combined_lines.join("\n"),
        };

        if status.success() {
            debug!("{} finished successfully", spec.tool());
            Ok(output)
        } else {
            debug!("{} exited with {:?}", spec.tool(), status.code());
            Err(command_failed_error(
                spec.tool().name(),
                status.code(),
                output.combined,
            ))
        }
    }
}

fn pump_lines<R: Read>(reader: R, stream: OutputStream, tx: &Sender<(OutputStream, String)>) {
    split_output_lines(reader, |line| {
        let _ = tx.send((stream, line));
    });
}

/// Splits a byte stream on `\r` and `\n`, skipping empty segments.
///
/// Invalid UTF-8 is replaced rather than rejected; ffmpeg echoes file
/// metadata verbatim and that is not always valid text.
pub fn split_output_lines<R: Read>(mut reader: R, mut emit: impl FnMut(String)) {
    let mut buf = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        };
        for &byte in &buf[..read] {
            if byte == b'\n' || byte == b'\r' {
                if !pending.is_empty() {
                    emit(String::from_utf8_lossy(&pending).into_owned());
                    pending.clear();
                }
            } else {
                pending.push(byte);
            }
        }
    }

    if !pending.is_empty() {
        emit(String::from_utf8_lossy(&pending).into_owned());
    }
}
