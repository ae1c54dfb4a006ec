// ffdeck-cli/src/lib.rs
//
// Library portion of the ffdeck CLI. Holds the argument definitions and the
// command dispatch so both the binary and the tests can reach them.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod terminal;

use ffdeck_core::{OperationController, SessionStore, SystemRunner, ToolAvailability, UiState};

use crate::commands::{CommandContext, audio, capabilities, session, video};
use crate::config::build_core_config;
use crate::error::CliResult;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands};

/// Runs one parsed command line to completion.
pub fn run(cli: Cli) -> CliResult<()> {
    let config = build_core_config(&cli)?;
    let verbose = cli.verbose;

    let command = match cli.command {
        Commands::Status => {
            return session::run_status(&SessionStore::new(config.state_file.clone()));
        }
        Commands::Capabilities(args) => {
            let availability = ToolAvailability::detect(&config);
            let controller = OperationController::new(config, SystemRunner);
            return capabilities::run_capabilities(controller, availability, args);
        }
        other => other,
    };

    let availability = ToolAvailability::detect(&config);
    let ui = UiState::ready(availability);
    if !ui.controls_enabled {
        terminal::print_warning(&ui.status);
    }
    let mut ctx = CommandContext::new(OperationController::new(config, SystemRunner), ui, verbose);

    match command {
        Commands::Probe(args) => session::run_probe(&mut ctx, args),
        Commands::ExtractAudio => audio::run_extract_audio(&mut ctx),
        Commands::ReplaceAudio(args) => audio::run_replace_audio(&mut ctx, args),
        Commands::CompressAudio(args) => audio::run_compress_audio(&mut ctx, args),
        Commands::Transcode(args) => video::run_transcode(&mut ctx, args),
        Commands::Upscale(args) => video::run_upscale(&mut ctx, args),
        Commands::Status | Commands::Capabilities(_) => Ok(()),
    }
}
