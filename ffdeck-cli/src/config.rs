// ffdeck-cli/src/config.rs
//
// Turns the parsed command line into a validated core configuration.
// Flags win over environment variables (handled by clap), which win over
// the core defaults.

use ffdeck_core::{CoreConfig, CoreConfigBuilder};

use crate::cli::Cli;
use crate::error::CliResult;

pub fn build_core_config(cli: &Cli) -> CliResult<CoreConfig> {
    let mut builder = CoreConfigBuilder::new();
    if let Some(path) = &cli.ffmpeg {
        builder = builder.ffmpeg_path(path.clone());
    }
    if let Some(path) = &cli.ffprobe {
        builder = builder.ffprobe_path(path.clone());
    }
    if let Some(path) = &cli.state_file {
        builder = builder.state_file(path.clone());
    }

    let config = builder.build();
    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}
