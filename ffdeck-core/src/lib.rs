//! Core library for ffdeck: small media utilities driven by ffmpeg and ffprobe.
//!
//! The pieces, bottom-up:
//!
//! - [`external`]: the `ProcessRunner` seam that launches the tools
//! - [`media`]: ffprobe-based inspection of a file
//! - [`session`]: the persisted state of the selected source video
//! - [`command`]: pure construction of every ffmpeg argument list
//! - [`controller`]: validation, execution and reporting of one operation
//! - [`worker`] / [`ui_state`]: background execution and what to display
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ffdeck_core::{CoreConfig, OperationController, OperationRequest, SystemRunner};
//! use std::path::PathBuf;
//!
//! let controller = OperationController::new(CoreConfig::default(), SystemRunner);
//! let outcome = controller.execute(
//!     OperationRequest::SelectSource { path: PathBuf::from("/videos/clip.mp4") },
//!     &mut |event| println!("{event:?}"),
//! );
//! assert!(outcome.is_success());
//! ```

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod external;
pub mod hardware_accel;
pub mod media;
pub mod session;
pub mod ui_state;
pub mod utils;
pub mod worker;

// Re-exports for public API
pub use command::{
    CommandBuilder, FrameRatePreset, Operation, ResolutionPreset, SourceGeometry, UserOptions,
};
pub use config::{CoreConfig, CoreConfigBuilder};
pub use controller::{
    ControllerEvent, OperationController, OperationFailure, OperationKind, OperationOutcome,
    OperationReport, OperationRequest, OperationState,
};
pub use error::{CoreError, CoreResult};
pub use external::{
    CommandSpec, ProcessOutput, ProcessRunner, ProgressUpdate, RunnerEvent, SystemRunner, Tool,
    ToolAvailability, check_dependency,
};
pub use hardware_accel::EncoderCapability;
pub use media::{MediaProbe, ProbeResult};
pub use session::{SessionState, SessionStore};
pub use ui_state::{StatusTone, UiState};
pub use utils::format_duration;
pub use worker::{OperationHandle, OperationWorker, WorkerMessage};
