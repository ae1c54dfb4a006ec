// ffdeck-cli/src/commands/capabilities.rs
//
// Reports which tools were found and which H.264 encoder would be used.

use ffdeck_core::{OperationController, ProcessRunner, Tool, ToolAvailability};

use crate::cli::CapabilitiesArgs;
use crate::error::CliResult;
use crate::terminal;

pub fn run_capabilities<R: ProcessRunner>(
    mut controller: OperationController<R>,
    availability: ToolAvailability,
    args: CapabilitiesArgs,
) -> CliResult<()> {
    terminal::print_section("Tools");
    for tool in [Tool::Ffmpeg, Tool::Ffprobe] {
        let location = controller.config().program(tool).display().to_string();
        let state = if availability.is_available(tool) {
            format!("found ({location})")
        } else {
            format!("not found ({location})")
        };
        terminal::print_status(tool.name(), &state);
    }

    terminal::print_section("Encoder");
    if !availability.ffmpeg {
        terminal::print_status("H.264", "unavailable without ffmpeg");
        return Ok(());
    }
    let capability = if args.refresh {
        controller.refresh_encoder_capability()
    } else {
        controller.encoder_capability()
    };
    terminal::print_status("H.264", &capability.to_string());
    Ok(())
}
