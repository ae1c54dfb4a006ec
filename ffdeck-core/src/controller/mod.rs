// ============================================================================
// ffdeck-core/src/controller/mod.rs
// ============================================================================
//
// OPERATION CONTROLLER: Runs one user-level operation from start to finish
//
// Each request moves through the same states:
//
//   Idle -> Validating -> Running -> Succeeded | Failed
//
// Validation covers everything that can be checked without starting a
// process (inputs exist, the output does not overwrite an input, the output
// directory can be created, the session holds what the operation needs).
// Session changes are persisted only once the operation has succeeded, so a
// failure never leaves a half-updated session behind.
//
// State changes, tool output and progress are reported through the event
// callback as they happen; the caller (usually `OperationWorker`) decides
// where they go.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::command::output_path;
use crate::command::profiles::FALLBACK_AUDIO_CODEC;
use crate::command::{
    CommandBuilder, FrameRatePreset, Operation, ResolutionPreset, SourceGeometry, UserOptions,
    frame_rate_differs, is_enlargement, replacement_audio_codec,
};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult, exit_label};
use crate::external::{
    CommandSpec, ProcessOutput, ProcessRunner, ProgressUpdate, RunnerEvent, Tool,
};
use crate::hardware_accel::{CapabilityCache, EncoderCapability};
use crate::media::MediaProbe;
use crate::session::{SessionState, SessionStore};
use crate::utils::{format_duration, tail_text};

mod validation;

use validation::{ensure_output_dir, require_distinct_output, require_existing_file};

// ============================================================================
// REQUESTS AND EVENTS
// ============================================================================

/// The user-level operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    SelectSource,
    ExtractAudio,
    ReplaceAudio,
    TranscodeForUpload,
    Upscale,
    CompressAudio,
}

impl OperationKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            OperationKind::SelectSource => "Probe source",
            OperationKind::ExtractAudio => "Extract audio",
            OperationKind::ReplaceAudio => "Replace audio",
            OperationKind::TranscodeForUpload => "Transcode for upload",
            OperationKind::Upscale => "Upscale",
            OperationKind::CompressAudio => "Compress audio",
        }
    }

    /// Tools that must be installed for this operation to run at all.
    #[must_use]
    pub fn required_tools(self) -> &'static [Tool] {
        match self {
            OperationKind::SelectSource => &[Tool::Ffprobe],
            OperationKind::ExtractAudio
            | OperationKind::TranscodeForUpload
            | OperationKind::CompressAudio => &[Tool::Ffmpeg],
            OperationKind::ReplaceAudio | OperationKind::Upscale => &[Tool::Ffmpeg, Tool::Ffprobe],
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A request as issued by the user interface.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationRequest {
    /// Probe a video and start a new session with it.
    SelectSource { path: PathBuf },
    ExtractAudio,
    /// Replace the session source's audio. Without an explicit file the
    /// previously extracted audio is used.
    ReplaceAudio { replacement: Option<PathBuf> },
    TranscodeForUpload {
        input: PathBuf,
        output: Option<PathBuf>,
    },
    Upscale {
        input: PathBuf,
        output: Option<PathBuf>,
        resolution: ResolutionPreset,
        frame_rate: FrameRatePreset,
    },
    /// Re-encode the audio track to MP3, keeping the video stream.
    CompressAudio {
        input: PathBuf,
        output: Option<PathBuf>,
    },
}

impl OperationRequest {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::SelectSource { .. } => OperationKind::SelectSource,
            OperationRequest::ExtractAudio => OperationKind::ExtractAudio,
            OperationRequest::ReplaceAudio { .. } => OperationKind::ReplaceAudio,
            OperationRequest::TranscodeForUpload { .. } => OperationKind::TranscodeForUpload,
            OperationRequest::Upscale { .. } => OperationKind::Upscale,
            OperationRequest::CompressAudio { .. } => OperationKind::CompressAudio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Validating,
    Running,
    Succeeded,
    Failed,
}

/// Reported while an operation executes.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    StateChanged(OperationState),
    /// Multi-step operations announce each step (1-based).
    Step {
        index: usize,
        total: usize,
        label: String,
    },
    /// One line of tool output.
    Output(String),
    Progress(ProgressUpdate),
    Warning(String),
    /// The previous attempt failed and is being repeated with this codec.
    Retrying { audio_codec: String },
}

#[derive(Debug)]
pub struct OperationReport {
    pub kind: OperationKind,
    pub message: String,
    pub output_path: Option<PathBuf>,
    /// The session as persisted by this operation, if it changed it.
    pub session: Option<SessionState>,
    pub warnings: Vec<String>,
    pub retried: bool,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct OperationFailure {
    pub kind: OperationKind,
    /// Human-readable summary including the tail of the tool's output.
    pub reason: String,
    pub error: CoreError,
    pub warnings: Vec<String>,
}

/// Terminal result of `OperationController::execute`.
#[derive(Debug)]
pub enum OperationOutcome {
    Succeeded(OperationReport),
    Failed(OperationFailure),
}

impl OperationOutcome {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationOutcome::Succeeded(report) => report.kind,
            OperationOutcome::Failed(failure) => failure.kind,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Succeeded(_))
    }
}

// ============================================================================
// RUN CONTEXT
// ============================================================================

struct Completed {
    message: String,
    output_path: Option<PathBuf>,
    session: Option<SessionState>,
}

struct RunContext<'e> {
    on_event: &'e mut dyn FnMut(ControllerEvent),
    state: OperationState,
    warnings: Vec<String>,
    retried: bool,
}

impl<'e> RunContext<'e> {
    fn new(on_event: &'e mut dyn FnMut(ControllerEvent)) -> Self {
        Self {
            on_event,
            state: OperationState::Idle,
            warnings: Vec::new(),
            retried: false,
        }
    }

    fn emit(&mut self, event: ControllerEvent) {
        (self.on_event)(event);
    }

    fn enter(&mut self, state: OperationState) {
        if self.state != state {
            debug!("State {:?} -> {:?}", self.state, state);
            self.state = state;
            self.emit(ControllerEvent::StateChanged(state));
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message.clone());
        self.emit(ControllerEvent::Warning(message));
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

/// Validates and executes operation requests against one session store.
///
/// Holds no per-operation state, so it can be shared behind an `Arc` with a
/// worker thread.
pub struct OperationController<R: ProcessRunner> {
    config: CoreConfig,
    runner: R,
    store: SessionStore,
    capability: CapabilityCache,
}

impl<R: ProcessRunner> OperationController<R> {
    pub fn new(config: CoreConfig, runner: R) -> Self {
        let store = SessionStore::new(config.state_file.clone());
        Self {
            config,
            runner,
            store,
            capability: CapabilityCache::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    #[must_use]
    pub fn session_store(&self) -> &SessionStore {
        &self.store
    }

    /// Detected encoder capability, cached after the first call.
    pub fn encoder_capability(&self) -> EncoderCapability {
        self.capability.get_or_detect(&self.runner, &self.config)
    }

    /// Forgets the cached capability and detects it again.
    pub fn refresh_encoder_capability(&mut self) -> EncoderCapability {
        self.capability.refresh(&self.runner, &self.config)
    }

    fn builder(&self) -> CommandBuilder<'_> {
        CommandBuilder::new(&self.config)
    }

    fn probe(&self) -> MediaProbe<'_, R> {
        MediaProbe::new(&self.runner, &self.config)
    }

    /// Runs `request` to completion. Never panics on tool failures; every
    /// error ends up in `OperationOutcome::Failed`.
    pub fn execute(
        &self,
        request: OperationRequest,
        on_event: &mut dyn FnMut(ControllerEvent),
    ) -> OperationOutcome {
        let kind = request.kind();
        let started = Instant::now();
        info!("{} started", kind);

        let mut ctx = RunContext::new(on_event);
        ctx.enter(OperationState::Validating);

        let result = match request {
            OperationRequest::SelectSource { path } => self.select_source(&path, &mut ctx),
            OperationRequest::ExtractAudio => self.extract_audio(&mut ctx),
            OperationRequest::ReplaceAudio { replacement } => {
                self.replace_audio(replacement, &mut ctx)
            }
            OperationRequest::TranscodeForUpload { input, output } => {
                self.transcode(input, output, &mut ctx)
            }
            OperationRequest::Upscale {
                input,
                output,
                resolution,
                frame_rate,
            } => self.upscale(input, output, resolution, frame_rate, &mut ctx),
            OperationRequest::CompressAudio { input, output } => {
                self.compress_audio(input, output, &mut ctx)
            }
        };

        let elapsed = started.elapsed();
        match result {
            Ok(done) => {
                ctx.enter(OperationState::Succeeded);
                info!(
                    "{} finished in {}: {}",
                    kind,
                    format_duration(elapsed.as_secs_f64()),
                    done.message
                );
                OperationOutcome::Succeeded(OperationReport {
                    kind,
                    message: done.message,
                    output_path: done.output_path,
                    session: done.session,
                    warnings: ctx.warnings,
                    retried: ctx.retried,
                    elapsed,
                })
            }
            Err(err) => {
                let reason = self.failure_reason(&err);
                error!("{} failed: {}", kind, reason);
                ctx.enter(OperationState::Failed);
                OperationOutcome::Failed(OperationFailure {
                    kind,
                    reason,
                    error: err,
                    warnings: ctx.warnings,
                })
            }
        }
    }

    /// Message shown for a failed operation. Tool failures carry only the
    /// tail of the tool's output.
    fn failure_reason(&self, err: &CoreError) -> String {
        match err {
            CoreError::ProcessFailed {
                tool,
                code,
                diagnostics,
            } => {
                let tail = tail_text(
                    diagnostics,
                    self.config.diagnostic_tail_lines,
                    self.config.diagnostic_tail_chars,
                );
                if tail.is_empty() {
                    format!("{tool} failed ({})", exit_label(code))
                } else {
                    format!("{tool} failed ({}):\n{tail}", exit_label(code))
                }
            }
            other => other.to_string(),
        }
    }

    fn run_spec(&self, spec: &CommandSpec, ctx: &mut RunContext<'_>) -> CoreResult<ProcessOutput> {
        info!("Running: {}", spec.display_line());
        self.runner.run(spec, &mut |event| match event {
            RunnerEvent::Line { text, .. } => ctx.emit(ControllerEvent::Output(text)),
            RunnerEvent::Progress(progress) => ctx.emit(ControllerEvent::Progress(progress)),
        })
    }

    // ---- Operations ----

    fn select_source(&self, path: &Path, ctx: &mut RunContext<'_>) -> CoreResult<Completed> {
        require_existing_file(path, "Source video")?;
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        ctx.enter(OperationState::Running);
        let probe = self.probe().probe(&path)?;
        for warning in &probe.warnings {
            ctx.warn(format!("{}: {}", display_name(&path), warning));
        }

        let session = SessionState::from_probe(&probe);
        self.store.save(&session)?;
        Ok(Completed {
            message: match probe.duration_secs {
                Some(duration) => format!(
                    "Info saved for: {} ({})",
                    display_name(&path),
                    format_duration(duration)
                ),
                None => format!("Info saved for: {}", display_name(&path)),
            },
            output_path: None,
            session: Some(session),
        })
    }

    fn extract_audio(&self, ctx: &mut RunContext<'_>) -> CoreResult<Completed> {
        let mut session = self.store.load_required()?;
        require_existing_file(&session.source_path, "Source video")?;

        let spec = self.builder().build(
            &Operation::ExtractAudio,
            Some(&session),
            &UserOptions::default(),
        )?;
        let output = output_of(&spec)?;
        require_distinct_output(&session.source_path, &output)?;
        ensure_output_dir(&output)?;

        ctx.enter(OperationState::Running);
        self.run_spec(&spec, ctx)?;

        session.extracted_audio_path = Some(output.clone());
        self.store.save(&session)?;
        Ok(Completed {
            message: format!("Audio extracted to {}", output.display()),
            output_path: Some(output),
            session: Some(session),
        })
    }

    fn replace_audio(
        &self,
        replacement: Option<PathBuf>,
        ctx: &mut RunContext<'_>,
    ) -> CoreResult<Completed> {
        let session = self.store.load_required()?;
        require_existing_file(&session.source_path, "Source video")?;

        let replacement = replacement
            .or_else(|| session.extracted_audio_path.clone())
            .ok_or_else(|| {
                CoreError::InvalidState(
                    "No replacement audio given and no audio has been extracted yet".to_string(),
                )
            })?;
        require_existing_file(&replacement, "Replacement audio")?;

        let operation = Operation::ReplaceAudio {
            replacement: replacement.clone(),
        };
        let mut options = UserOptions::default();
        let spec = self.builder().build(&operation, Some(&session), &options)?;
        let output = output_of(&spec)?;
        require_distinct_output(&session.source_path, &output)?;
        require_distinct_output(&replacement, &output)?;
        ensure_output_dir(&output)?;

        ctx.enter(OperationState::Running);
        match self.probe().probe_audio_codec(&replacement)? {
            Some(codec) => debug!("Replacement audio codec: {}", codec),
            None => {
                return Err(CoreError::PreconditionFailed(format!(
                    "{} has no audio stream",
                    replacement.display()
                )));
            }
        }

        self.log_expected_length(&session.source_path, &replacement);

        let codec = replacement_audio_codec(&session, &options);
        match self.run_spec(&spec, ctx) {
            Ok(_) => {}
            Err(CoreError::ProcessFailed { .. }) if codec != FALLBACK_AUDIO_CODEC => {
                ctx.warn(format!(
                    "Muxing with {codec} audio failed; retrying with {FALLBACK_AUDIO_CODEC}"
                ));
                ctx.emit(ControllerEvent::Retrying {
                    audio_codec: FALLBACK_AUDIO_CODEC.to_string(),
                });
                ctx.retried = true;
                options.audio_codec = Some(FALLBACK_AUDIO_CODEC.to_string());
                let retry = self.builder().build(&operation, Some(&session), &options)?;
                self.run_spec(&retry, ctx)?;
            }
            Err(err) => return Err(err),
        }

        Ok(Completed {
            message: format!("Video with new audio saved to {}", output.display()),
            output_path: Some(output),
            session: None,
        })
    }

    /// `-shortest` cuts the output to the shorter of the two inputs.
    fn log_expected_length(&self, video: &Path, audio: &Path) {
        let probe = self.probe();
        let duration = |path: &Path| match probe.probe_duration(path) {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Could not read the duration of {}: {}", path.display(), e);
                None
            }
        };
        if let (Some(video), Some(audio)) = (duration(video), duration(audio)) {
            info!(
                "Expected output length: {}",
                format_duration(video.min(audio))
            );
        }
    }

    fn transcode(
        &self,
        input: PathBuf,
        output: Option<PathBuf>,
        ctx: &mut RunContext<'_>,
    ) -> CoreResult<Completed> {
        require_existing_file(&input, "Input video")?;
        let output = output.unwrap_or_else(|| output_path::converted_path(&input));
        require_distinct_output(&input, &output)?;
        ensure_output_dir(&output)?;

        ctx.enter(OperationState::Running);
        let options = UserOptions {
            encoder: self.encoder_capability(),
            audio_codec: None,
        };
        info!("Encoding with {}", options.encoder);
        let spec = self.builder().build(
            &Operation::TranscodeForUpload {
                input,
                output: Some(output.clone()),
            },
            None,
            &options,
        )?;
        self.run_spec(&spec, ctx)?;

        Ok(Completed {
            message: format!("File saved as {}", output.display()),
            output_path: Some(output),
            session: None,
        })
    }

    fn upscale(
        &self,
        input: PathBuf,
        output: Option<PathBuf>,
        resolution: ResolutionPreset,
        frame_rate: FrameRatePreset,
        ctx: &mut RunContext<'_>,
    ) -> CoreResult<Completed> {
        require_existing_file(&input, "Input video")?;
        if resolution == ResolutionPreset::Source && frame_rate == FrameRatePreset::Source {
            return Err(CoreError::PreconditionFailed(
                "Nothing to do: resolution and frame rate are both set to Source".to_string(),
            ));
        }
        let output =
            output.unwrap_or_else(|| output_path::upscaled_path(&input, resolution, frame_rate));
        require_distinct_output(&input, &output)?;
        ensure_output_dir(&output)?;

        ctx.enter(OperationState::Running);
        let probe = self.probe().probe(&input)?;
        if probe.width == 0 || probe.height == 0 {
            return Err(CoreError::PreconditionFailed(format!(
                "Could not determine the resolution of {}",
                input.display()
            )));
        }
        let source = SourceGeometry {
            width: probe.width,
            height: probe.height,
            frame_rate: probe.frame_rate,
        };

        let scales = match resolution.dimensions() {
            Some(target) if !is_enlargement(&source, target) => {
                ctx.warn(format!(
                    "{resolution} is not larger than the source ({}x{}); keeping the source resolution",
                    source.width, source.height
                ));
                false
            }
            Some(_) => true,
            None => false,
        };
        let retimes = match frame_rate.rate() {
            Some(rate) if !frame_rate_differs(&source, rate) => {
                ctx.warn(format!(
                    "Source already runs at {:.2} fps; frame rate unchanged",
                    source.frame_rate
                ));
                false
            }
            Some(_) => true,
            None => false,
        };
        if !scales && !retimes {
            return Err(CoreError::PreconditionFailed(format!(
                "Nothing to do: {} already matches {resolution} / {frame_rate}",
                display_name(&input)
            )));
        }

        let options = UserOptions {
            encoder: self.encoder_capability(),
            audio_codec: None,
        };
        info!("Encoding with {}", options.encoder);
        let spec = self.builder().build(
            &Operation::Upscale {
                input,
                output: Some(output.clone()),
                source,
                resolution,
                frame_rate,
            },
            None,
            &options,
        )?;
        self.run_spec(&spec, ctx)?;

        Ok(Completed {
            message: format!("Upscaled video saved as {}", output.display()),
            output_path: Some(output),
            session: None,
        })
    }

    fn compress_audio(
        &self,
        input: PathBuf,
        output: Option<PathBuf>,
        ctx: &mut RunContext<'_>,
    ) -> CoreResult<Completed> {
        require_existing_file(&input, "Input video")?;
        let output = output.unwrap_or_else(|| output_path::compressed_audio_path(&input));
        require_distinct_output(&input, &output)?;
        ensure_output_dir(&output)?;

        // Removed on drop, including when a step fails.
        let scratch = tempfile::Builder::new().prefix("ffdeck_").tempdir()?;
        let wav = scratch.path().join("temp_audio.wav");
        let mp3 = scratch.path().join("temp_audio.mp3");

        let steps = [
            (
                "Extracting audio",
                Operation::ExtractPcm {
                    input: input.clone(),
                    output: wav.clone(),
                },
            ),
            (
                "Encoding MP3",
                Operation::EncodeMp3 {
                    input: wav,
                    output: mp3.clone(),
                },
            ),
            (
                "Muxing",
                Operation::MuxAudio {
                    video: input,
                    audio: mp3,
                    output: output.clone(),
                },
            ),
        ];

        ctx.enter(OperationState::Running);
        let total = steps.len();
        for (index, (label, operation)) in steps.iter().enumerate() {
            ctx.emit(ControllerEvent::Step {
                index: index + 1,
                total,
                label: (*label).to_string(),
            });
            let spec = self
                .builder()
                .build(operation, None, &UserOptions::default())?;
            self.run_spec(&spec, ctx)?;
        }

        Ok(Completed {
            message: format!("File with MP3 audio saved as {}", output.display()),
            output_path: Some(output),
            session: None,
        })
    }
}

fn output_of(spec: &CommandSpec) -> CoreResult<PathBuf> {
    spec.output_path().map(Path::to_path_buf).ok_or_else(|| {
        CoreError::InvalidState(format!("Command has no output file: {}", spec.display_line()))
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfigBuilder;
    use crate::external::mocks::MockRunner;
    use tempfile::{TempDir, tempdir};

    fn setup() -> (TempDir, OperationController<MockRunner>, MockRunner) {
        let dir = tempdir().unwrap();
        let config = CoreConfigBuilder::new()
            .state_file(dir.path().join("session.json"))
            .build();
        let runner = MockRunner::new();
        let controller = OperationController::new(config, runner.clone());
        (dir, controller, runner)
    }

    fn collect(
        controller: &OperationController<MockRunner>,
        request: OperationRequest,
    ) -> (OperationOutcome, Vec<ControllerEvent>) {
        let mut events = Vec::new();
        let outcome = controller.execute(request, &mut |event| events.push(event));
        (outcome, events)
    }

    fn states(events: &[ControllerEvent]) -> Vec<OperationState> {
        events
            .iter()
            .filter_map(|e| match e {
                ControllerEvent::StateChanged(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn missing_source_fails_during_validation() {
        let (dir, controller, runner) = setup();
        let (outcome, events) = collect(
            &controller,
            OperationRequest::SelectSource {
                path: dir.path().join("missing.mp4"),
            },
        );

        assert!(!outcome.is_success());
        assert_eq!(
            states(&events),
            [OperationState::Validating, OperationState::Failed]
        );
        assert!(runner.received_calls().is_empty());
    }

    #[test]
    fn failure_reason_keeps_only_the_tail() {
        let (_dir, controller, _runner) = setup();
        let diagnostics = (1..=50)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let reason = controller.failure_reason(&CoreError::ProcessFailed {
            tool: "ffmpeg".to_string(),
            code: Some(1),
            diagnostics,
        });
        assert!(reason.starts_with("ffmpeg failed (exit code 1):"));
        assert!(reason.contains("line 50"));
        assert!(reason.contains("line 41"));
        assert!(!reason.contains("line 40"));
    }

    #[test]
    fn upscale_without_changes_is_rejected() {
        let (dir, controller, runner) = setup();
        let input = dir.path().join("clip.mp4");
        fs::write(&input, b"video").unwrap();

        let (outcome, _) = collect(
            &controller,
            OperationRequest::Upscale {
                input,
                output: None,
                resolution: ResolutionPreset::Source,
                frame_rate: FrameRatePreset::Source,
            },
        );
        match outcome {
            OperationOutcome::Failed(failure) => {
                assert!(matches!(failure.error, CoreError::PreconditionFailed(_)));
            }
            OperationOutcome::Succeeded(_) => panic!("upscale should have been rejected"),
        }
        assert!(runner.received_calls().is_empty());
    }

    #[test]
    fn operation_kinds_know_their_tools() {
        assert_eq!(OperationKind::SelectSource.required_tools(), [Tool::Ffprobe]);
        assert_eq!(
            OperationKind::Upscale.required_tools(),
            [Tool::Ffmpeg, Tool::Ffprobe]
        );
        assert_eq!(
            OperationRequest::CompressAudio {
                input: PathBuf::from("a.mp4"),
                output: None
            }
            .kind(),
            OperationKind::CompressAudio
        );
    }
}
