//! Video durations.
//!
//! The YouTube API reports durations as ISO-8601 durations (`PT4M13S`, `PT1H2M3S`, and for videos
//! longer than a day `P1DT2H`). Internally we only ever deal in whole seconds.

use eyre::Context;
use jiff::{Span, SpanRelativeTo, Unit};

/// Parses an ISO-8601 duration into a whole number of seconds.
///
/// Days are taken to be 24 hours long. Fractional seconds are truncated. Calendar units (years
/// and months) and negative durations are rejected since no video can be that long (or short).
pub fn parse_iso8601(duration: &str) -> eyre::Result<u64> {
    let span: Span = duration
        .trim()
        .parse()
        .with_context(|| format!("parse ISO-8601 duration {duration:?}"))?;
    if span.is_negative() {
        eyre::bail!("video duration {duration:?} is negative");
    }
    let seconds = span
        .total((Unit::Second, SpanRelativeTo::days_are_24_hours()))
        .with_context(|| format!("convert duration {duration:?} to seconds"))?;
    Ok(seconds as u64)
}

/// Formats a number of seconds as `M:SS`, or `H:MM:SS` once it reaches an hour.
pub fn format_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
