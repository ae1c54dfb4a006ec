// ffdeck-cli/src/main.rs
//
// Entry point for the ffdeck binary: parse arguments, set up logging, run
// the command and map any error to a non-zero exit code.

use std::process;

use clap::Parser;
use ffdeck_cli::{Cli, logging, run, terminal};

fn main() {
    let cli = Cli::parse();

    terminal::set_color(!cli.no_color);

    if let Err(e) = logging::init_logging(cli.verbose, cli.log_file.as_deref()) {
        terminal::print_error(&e.to_string());
        process::exit(1);
    }

    if let Err(e) = run(cli) {
        log::debug!("Command failed: {e:?}");
        terminal::print_error(&e.to_string());
        process::exit(1);
    }
}
