// ============================================================================
// ffdeck-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: Styled lines and the activity spinner
//
// Everything the user is meant to read goes through these helpers so the
// symbols and colours stay consistent. Colour is switched off globally with
// `set_color(false)` (the `--no-color` flag).

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Styling constants for terminal output
pub mod styling {
    pub const SUCCESS_SYMBOL: &str = "✓";
    pub const WARNING_SYMBOL: &str = "!";
    pub const ERROR_SYMBOL: &str = "✗";
    pub const SECTION_PREFIX: &str = "===== ";
    pub const SECTION_SUFFIX: &str = " =====";
    pub const STATUS_INDENT: &str = "  ";
    pub const LABEL_WIDTH: usize = 18;
}

/// Enables or disables coloured output on both streams.
pub fn set_color(enable: bool) {
    console::set_colors_enabled(enable);
    console::set_colors_enabled_stderr(enable);
}

pub fn print_section(title: &str) {
    println!(
        "\n{}",
        style(format!(
            "{}{}{}",
            styling::SECTION_PREFIX,
            title,
            styling::SECTION_SUFFIX
        ))
        .cyan()
        .bold()
    );
}

/// Prints an aligned `label: value` line.
pub fn print_status(label: &str, value: &str) {
    println!("{}", format_status(label, value));
}

fn format_status(label: &str, value: &str) -> String {
    format!(
        "{}{:<width$} {}",
        styling::STATUS_INDENT,
        format!("{label}:"),
        value,
        width = styling::LABEL_WIDTH
    )
}

pub fn print_success(message: &str) {
    println!(
        "{} {}",
        style(styling::SUCCESS_SYMBOL).green().bold(),
        message
    );
}

pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        style(styling::WARNING_SYMBOL).yellow().bold(),
        style(message).yellow()
    );
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", style(styling::ERROR_SYMBOL).red().bold(), message);
}

/// Spinner shown while a worker runs. Hidden automatically when stderr is
/// not a terminal.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
