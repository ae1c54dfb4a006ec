//! Small helpers shared by the probe, command builder and controller.

use std::fs;
use std::path::Path;

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// First entry of a comma-separated ffprobe format name
/// (`"mov,mp4,m4a,3gp,3g2,mj2"` -> `"mov"`).
#[must_use]
pub fn primary_format(format_name: &str) -> &str {
    format_name.split(',').next().unwrap_or_default().trim()
}

/// Renders a frame rate for an ffmpeg `-r` argument: whole rates without a
/// fraction, others with three decimals.
#[must_use]
pub fn format_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{}", rate as u64)
    } else {
        format!("{rate:.3}")
    }
}

/// Keeps the last `max_lines` non-empty lines of `text`, then the last
/// `max_chars` characters of that.
#[must_use]
pub fn tail_text(text: &str, max_lines: usize, max_chars: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    let tail = lines[start..].join("\n");

    let char_count = tail.chars().count();
    if char_count <= max_chars {
        tail
    } else {
        tail.chars().skip(char_count - max_chars).collect()
    }
}

/// Whether two paths refer to the same file, resolving symlinks and
/// relative components when both exist.
#[must_use]
pub fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_duration(-1.0), "??:??:??");
        assert_eq!(format_duration(f64::NAN), "??:??:??");
    }

    #[test]
    fn takes_first_format_token() {
        assert_eq!(primary_format("mov,mp4,m4a,3gp,3g2,mj2"), "mov");
        assert_eq!(primary_format("matroska,webm"), "matroska");
        assert_eq!(primary_format("avi"), "avi");
        assert_eq!(primary_format(""), "");
    }

    #[test]
    fn formats_rates() {
        assert_eq!(format_rate(60.0), "60");
        assert_eq!(format_rate(29.97), "29.970");
    }

    #[test]
    fn tail_respects_line_and_char_limits() {
        let text = (1..=20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let tail = tail_text(&text, 3, 1000);
        assert_eq!(tail, "line 18\nline 19\nline 20");

        let clipped = tail_text(&text, 3, 7);
        assert_eq!(clipped, "line 20");
    }

    #[test]
    fn identical_paths_are_the_same_file() {
        assert!(same_file(Path::new("a/b.mp4"), Path::new("a/b.mp4")));
        assert!(!same_file(
            Path::new("/nonexistent/a.mp4"),
            Path::new("/nonexistent/b.mp4")
        ));
    }
}
