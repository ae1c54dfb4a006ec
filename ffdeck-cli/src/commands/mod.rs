//! Command implementations for the CLI.
//!
//! Operation commands share one foreground loop: the request runs on an
//! `OperationWorker` thread while this thread folds the worker's messages
//! into a `UiState` and renders it on a spinner.

use std::sync::Arc;
use std::time::Duration;

use ffdeck_core::{
    ControllerEvent, CoreError, OperationController, OperationHandle, OperationKind,
    OperationOutcome, OperationReport, OperationRequest, OperationWorker, ProcessRunner, UiState,
    WorkerMessage, format_duration,
};
use indicatif::ProgressBar;

use crate::error::CliResult;
use crate::terminal;

/// Probe and session status commands.
pub mod session;

/// Audio extraction, replacement and MP3 compression.
pub mod audio;

/// Upload transcode and upscaling.
pub mod video;

/// Tool and encoder capability report.
pub mod capabilities;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared state for commands that run an operation.
pub struct CommandContext<R: ProcessRunner + 'static> {
    pub controller: Arc<OperationController<R>>,
    pub ui: UiState,
    pub verbose: bool,
}

impl<R: ProcessRunner + 'static> CommandContext<R> {
    pub fn new(controller: OperationController<R>, ui: UiState, verbose: bool) -> Self {
        Self {
            controller: Arc::new(controller),
            ui,
            verbose,
        }
    }

    /// Fails with `ExecutableNotFound` when a tool `kind` needs was not
    /// found at startup.
    pub fn ensure_can_start(&self, kind: OperationKind) -> CliResult<()> {
        let missing = self.ui.missing_tools(kind);
        if missing.is_empty() {
            return Ok(());
        }
        let config = self.controller.config();
        let names = missing
            .iter()
            .map(|tool| format!("{} ({})", tool, config.program(*tool).display()))
            .collect::<Vec<_>>()
            .join(", ");
        Err(CoreError::ExecutableNotFound(names))
    }

    /// Runs `request` on a worker thread and blocks until it finishes.
    pub fn run(&mut self, request: OperationRequest) -> CliResult<OperationReport> {
        let kind = request.kind();
        self.ensure_can_start(kind)?;

        let ui = self.ui.clone().begin(kind);
        let spinner = terminal::create_spinner(&render_status(&ui));
        let mut handle = match OperationWorker::spawn(Arc::clone(&self.controller), request) {
            Ok(handle) => handle,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e);
            }
        };

        let result = drive(&handle, ui, &spinner, self.verbose);
        handle.join_thread();
        spinner.finish_and_clear();

        let (ui, outcome) = result?;
        self.ui = ui;
        match outcome {
            OperationOutcome::Succeeded(report) => {
                terminal::print_success(&success_line(&report));
                Ok(report)
            }
            OperationOutcome::Failed(failure) => Err(CoreError::OperationFailed(failure.reason)),
        }
    }
}

fn drive(
    handle: &OperationHandle,
    mut ui: UiState,
    spinner: &ProgressBar,
    verbose: bool,
) -> CliResult<(UiState, OperationOutcome)> {
    loop {
        let Some(message) = handle.next_message(POLL_INTERVAL)? else {
            continue;
        };
        match &message {
            WorkerMessage::Event(ControllerEvent::Output(line)) => {
                log::trace!("{}", line);
                if verbose {
                    spinner.println(line);
                }
            }
            WorkerMessage::Event(ControllerEvent::Warning(warning)) => {
                spinner.suspend(|| terminal::print_warning(warning));
            }
            _ => {}
        }
        ui = ui.apply(&message);
        spinner.set_message(render_status(&ui));
        if let WorkerMessage::Finished(outcome) = message {
            return Ok((ui, outcome));
        }
    }
}

/// Result message with the time the operation took.
pub fn success_line(report: &OperationReport) -> String {
    format!(
        "{} [{}]",
        report.message,
        format_duration(report.elapsed.as_secs_f64())
    )
}

/// Status line with the latest ffmpeg progress appended.
pub fn render_status(ui: &UiState) -> String {
    match &ui.progress {
        Some(progress) => format!(
            "{} (time {}, {:.1}x)",
            ui.status, progress.time, progress.speed
        ),
        None => ui.status.clone(),
    }
}
