// ============================================================================
// ffdeck-core/src/external/mocks.rs
// ============================================================================
//
// MOCK IMPLEMENTATIONS: Scripted ProcessRunner for tests
//
// `MockRunner` answers each command from a queue of expectations. An
// expectation matches when any argument of the command contains its pattern;
// the first match is consumed. Every received command is recorded so tests
// can assert on the exact argument lists.
//
// Only compiled for tests or with the `test-mocks` feature.

use std::sync::{Arc, Mutex};

use super::{CommandSpec, OutputStream, ProcessOutput, ProcessRunner, RunnerEvent};
use crate::error::{CoreError, CoreResult, command_failed_error};

#[derive(Debug, Clone)]
enum MockResponse {
    Success { stdout: String, stderr_lines: Vec<String> },
    Failure { code: i32, output: String },
    NotFound,
}

#[derive(Debug, Clone)]
struct MockExpectation {
    pattern: String,
    response: MockResponse,
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<MockExpectation>,
    calls: Vec<CommandSpec>,
}

/// Scripted runner. Clones share the same expectations and call log.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
}

impl MockRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, pattern: &str, response: MockResponse) {
        self.state
            .lock()
            .expect("mock state poisoned")
            .expectations
            .push(MockExpectation {
                pattern: pattern.to_string(),
                response,
            });
    }

    /// Next command containing `pattern` succeeds and prints `stdout`.
    pub fn expect_success(&self, pattern: &str, stdout: &str) {
        self.push(
            pattern,
            MockResponse::Success {
                stdout: stdout.to_string(),
                stderr_lines: Vec::new(),
            },
        );
    }

    /// Next command containing `pattern` succeeds after writing these
    /// lines to stderr, the way ffmpeg reports progress.
    pub fn expect_stderr_lines(&self, pattern: &str, lines: &[&str]) {
        self.push(
            pattern,
            MockResponse::Success {
                stdout: String::new(),
                stderr_lines: lines.iter().map(ToString::to_string).collect(),
            },
        );
    }

    /// Next command containing `pattern` exits with `code`.
    pub fn expect_failure(&self, pattern: &str, code: i32, output: &str) {
        self.push(
            pattern,
            MockResponse::Failure {
                code,
                output: output.to_string(),
            },
        );
    }

    /// Next command containing `pattern` cannot be launched.
    pub fn expect_not_found(&self, pattern: &str) {
        self.push(pattern, MockResponse::NotFound);
    }

    /// Every command received so far, in order.
    #[must_use]
    pub fn received_calls(&self) -> Vec<CommandSpec> {
        self.state.lock().expect("mock state poisoned").calls.clone()
    }

    #[must_use]
    pub fn pending_expectations(&self) -> usize {
        self.state
            .lock()
            .expect("mock state poisoned")
            .expectations
            .len()
    }
}

impl ProcessRunner for MockRunner {
    fn run(
        &self,
        spec: &CommandSpec,
        on_event: &mut dyn FnMut(RunnerEvent),
    ) -> CoreResult<ProcessOutput> {
        let response = {
            let mut state = self.state.lock().expect("mock state poisoned");
            state.calls.push(spec.clone());
            let position = state.expectations.iter().position(|expectation| {
                spec.get_args()
                    .iter()
                    .any(|arg| arg.contains(&expectation.pattern))
            });
            match position {
                Some(index) => state.expectations.remove(index).response,
                None => panic!("MockRunner: unexpected command: {}", spec.display_line()),
            }
        };

        match response {
            MockResponse::Success {
                stdout,
                stderr_lines,
            } => {
                for line in &stderr_lines {
                    if let Some(progress) = ffmpeg_sidecar::log_parser::try_parse_progress(line) {
                        on_event(RunnerEvent::Progress(progress.into()));
                    }
                    on_event(RunnerEvent::Line {
                        stream: OutputStream::Stderr,
                        text: line.clone(),
                    });
                }
                for line in stdout.lines().filter(|l| !l.is_empty()) {
                    on_event(RunnerEvent::Line {
                        stream: OutputStream::Stdout,
                        text: line.to_string(),
                    });
                }
                let stderr = stderr_lines.join("\n");
                let combined = [stdout.trim_end(), stderr.as_str()]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(ProcessOutput {
                    exit_code: 0,
                    stdout,
                    stderr,
                    combined,
                })
            }
            MockResponse::Failure { code, output } => {
                for line in output.lines() {
                    on_event(RunnerEvent::Line {
                        stream: OutputStream::Stderr,
                        text: line.to_string(),
                    });
                }
                Err(command_failed_error(spec.tool().name(), Some(code), output))
            }
            MockResponse::NotFound => Err(CoreError::ExecutableNotFound(
                spec.program().display().to_string(),
            )),
        }
    }
}
