// ============================================================================
// ffdeck-core/src/ui_state.rs
// ============================================================================
//
// UI STATE: What the foreground should currently show
//
// `UiState` is a plain value folded over the worker's messages. Keeping the
// transitions here, away from any terminal code, makes them testable:
//
//   ready ──begin──> busy (controls disabled) ──Finished──> ready
//
// Controls stay disabled for good when a required tool is missing.

use std::path::PathBuf;

use crate::controller::{ControllerEvent, OperationKind, OperationOutcome, OperationState};
use crate::external::{ProgressUpdate, Tool, ToolAvailability};
use crate::worker::WorkerMessage;

/// Colour-free severity of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Neutral,
    Busy,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub status: String,
    pub tone: StatusTone,
    pub controls_enabled: bool,
    pub operation: Option<OperationKind>,
    pub state: OperationState,
    pub step: Option<(usize, usize, String)>,
    pub progress: Option<ProgressUpdate>,
    pub warnings: Vec<String>,
    pub last_output: Option<PathBuf>,
    availability: ToolAvailability,
}

impl UiState {
    /// Initial state after the startup tool check.
    #[must_use]
    pub fn ready(availability: ToolAvailability) -> Self {
        let missing = availability.missing();
        let (status, tone, controls_enabled) = if missing.is_empty() {
            ("Ready".to_string(), StatusTone::Neutral, true)
        } else {
            (
                format!("Missing required tools: {}", tool_list(&missing)),
                StatusTone::Error,
                false,
            )
        };

        Self {
            status,
            tone,
            controls_enabled,
            operation: None,
            state: OperationState::Idle,
            step: None,
            progress: None,
            warnings: Vec::new(),
            last_output: None,
            availability,
        }
    }

    /// Tools `kind` needs that were not found at startup.
    #[must_use]
    pub fn missing_tools(&self, kind: OperationKind) -> Vec<Tool> {
        kind.required_tools()
            .iter()
            .copied()
            .filter(|tool| !self.availability.is_available(*tool))
            .collect()
    }

    /// Whether a new operation of `kind` may start now.
    #[must_use]
    pub fn can_start(&self, kind: OperationKind) -> bool {
        self.operation.is_none() && self.missing_tools(kind).is_empty()
    }

    /// Marks `kind` as started and disables the controls.
    #[must_use]
    pub fn begin(mut self, kind: OperationKind) -> Self {
        self.operation = Some(kind);
        self.state = OperationState::Idle;
        self.status = format!("{kind}: starting");
        self.tone = StatusTone::Busy;
        self.controls_enabled = false;
        self.step = None;
        self.progress = None;
        self.warnings.clear();
        self
    }

    /// Applies one message from the worker.
    #[must_use]
    pub fn apply(self, message: &WorkerMessage) -> Self {
        match message {
            WorkerMessage::Event(event) => self.on_event(event),
            WorkerMessage::Finished(outcome) => self.on_finished(outcome),
        }
    }

    fn label(&self) -> &'static str {
        self.operation.map_or("Operation", OperationKind::label)
    }

    fn on_event(mut self, event: &ControllerEvent) -> Self {
        match event {
            ControllerEvent::StateChanged(state) => {
                self.state = *state;
                match state {
                    OperationState::Validating => {
                        self.status = format!("{}: checking inputs", self.label());
                    }
                    OperationState::Running => {
                        self.status = format!("{}: running", self.label());
                    }
                    OperationState::Idle | OperationState::Succeeded | OperationState::Failed => {}
                }
            }
            ControllerEvent::Step {
                index,
                total,
                label,
            } => {
                self.status = format!("{}: step {index}/{total} {label}", self.label());
                self.step = Some((*index, *total, label.clone()));
                self.progress = None;
            }
            ControllerEvent::Progress(progress) => {
                self.progress = Some(progress.clone());
            }
            ControllerEvent::Warning(message) => {
                self.warnings.push(message.clone());
            }
            ControllerEvent::Retrying { audio_codec } => {
                self.status = format!("{}: retrying with {audio_codec} audio", self.label());
                self.progress = None;
            }
            ControllerEvent::Output(_) => {}
        }
        self
    }

    fn on_finished(mut self, outcome: &OperationOutcome) -> Self {
        match outcome {
            OperationOutcome::Succeeded(report) => {
                self.state = OperationState::Succeeded;
                self.status = report.message.clone();
                self.tone = if self.warnings.is_empty() {
                    StatusTone::Success
                } else {
                    StatusTone::Warning
                };
                self.last_output = report.output_path.clone();
            }
            OperationOutcome::Failed(failure) => {
                self.state = OperationState::Failed;
                self.status = failure.reason.clone();
                self.tone = StatusTone::Error;
            }
        }
        self.operation = None;
        self.step = None;
        self.progress = None;
        self.controls_enabled = self.availability.missing().is_empty();
        self
    }
}

fn tool_list(tools: &[Tool]) -> String {
    tools
        .iter()
        .map(|tool| tool.name())
        .collect::<Vec<_>>()
        .join(", ")
}
