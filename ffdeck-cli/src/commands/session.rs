// ffdeck-cli/src/commands/session.rs
//
// `probe` selects a source video; `status` shows what is remembered about it.

use ffdeck_core::{OperationRequest, ProcessRunner, SessionState, SessionStore};

use super::CommandContext;
use crate::cli::ProbeArgs;
use crate::error::CliResult;
use crate::terminal;

pub fn run_probe<R: ProcessRunner + 'static>(
    ctx: &mut CommandContext<R>,
    args: ProbeArgs,
) -> CliResult<()> {
    let report = ctx.run(OperationRequest::SelectSource { path: args.video })?;
    if let Some(session) = &report.session {
        print_session(session);
    }
    Ok(())
}

/// Prints the stored session. A missing session is not an error.
pub fn run_status(store: &SessionStore) -> CliResult<()> {
    match store.load() {
        Some(session) => print_session(&session),
        None => {
            println!("No session recorded. Run `ffdeck probe <VIDEO>` to select a source.");
        }
    }
    Ok(())
}

fn print_session(session: &SessionState) {
    terminal::print_section("Source");
    terminal::print_status("File", &session.source_path.display().to_string());
    terminal::print_status("Video codec", &session.video_codec);
    terminal::print_status(
        "Audio codec",
        session.audio_codec.as_deref().unwrap_or("none"),
    );
    terminal::print_status("Container", &session.container_format);
    terminal::print_status(
        "Start offset",
        &format!("{:.3}s", session.start_time_offset_seconds),
    );
    terminal::print_status(
        "Extracted audio",
        &session
            .extracted_audio_path
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string()),
    );
}
