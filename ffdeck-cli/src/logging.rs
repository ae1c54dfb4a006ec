// ============================================================================
// ffdeck-cli/src/logging.rs
// ============================================================================
//
// LOGGING: fern dispatch for the console and an optional log file
//
// The console only shows warnings and errors unless `--verbose` is given;
// user-facing progress goes through terminal.rs instead. The log file, when
// requested, always receives debug-level records with timestamps.

use std::path::Path;

use console::style;
use log::{Level, LevelFilter};

use crate::error::{CliErrorContext, CliResult};

/// Returns the current local timestamp formatted as "YYYY-MM-DD HH:MM:SS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn console_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

fn styled_level(level: Level) -> String {
    match level {
        Level::Error => style("error").red().bold().to_string(),
        Level::Warn => style("warning").yellow().bold().to_string(),
        Level::Info => style("info").cyan().to_string(),
        Level::Debug | Level::Trace => style("debug").dim().to_string(),
    }
}

/// Installs the global logger. Must be called once, before any logging.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> CliResult<()> {
    let console = fern::Dispatch::new()
        .level(console_level(verbose))
        .format(|out, message, record| {
            out.finish(format_args!("{}: {}", styled_level(record.level()), message))
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new()
        .level(LevelFilter::Debug)
        .chain(console);

    if let Some(path) = log_file {
        let file = fern::log_file(path)
            .cli_context(format!("Failed to open log file {}", path.display()))?;
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .level(LevelFilter::Debug)
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} [{}] {}: {}",
                        get_timestamp(),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(file),
        );
    }

    dispatch
        .apply()
        .map_err(|e| crate::cli_error!("Failed to initialise logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_lowers_console_level() {
        assert_eq!(console_level(false), LevelFilter::Warn);
        assert_eq!(console_level(true), LevelFilter::Debug);
    }

    #[test]
    fn timestamp_has_date_and_time() {
        let stamp = get_timestamp();
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
    }
}
