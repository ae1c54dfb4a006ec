//! Media inspection through ffprobe.
//!
//! `MediaProbe` asks ffprobe for JSON where it can and falls back to single
//! scalar queries for one-off values.

mod probe;

pub use probe::{MediaProbe, ProbeResult, parse_frame_rate, parse_probe_output};
