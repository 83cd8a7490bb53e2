//! Loading and saving capture records.
//!
//! Captures live in memory while decoding; files only come into play when
//! the user stores or replays them. Two formats are read:
//!
//! - `.json`: an array of [Capture] records, as written by [save_captures]
//! - anything else: a plain tick list (whitespace- or comma-separated
//!   durations, e.g. pasted from a logic analyzer trace)

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::capture::Capture;

/// Load captures from a JSON file.
pub fn load_captures(path: &Path) -> Result<Vec<Capture>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read capture file {:?}", path))?;
    let captures: Vec<Capture> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse captures from {:?}", path))?;
    tracing::info!(count = captures.len(), file = %path.display(), "loaded captures");
    Ok(captures)
}

/// Save captures to a JSON file.
pub fn save_captures(path: &Path, captures: &[Capture]) -> Result<()> {
    let json = serde_json::to_string_pretty(captures).context("Failed to serialize captures")?;
    fs::write(path, json).with_context(|| format!("Failed to write capture file {:?}", path))?;
    tracing::info!(count = captures.len(), file = %path.display(), "saved captures");
    Ok(())
}

/// Parse a plain tick list: unsigned durations separated by whitespace or
/// commas. The first value is the leading gap slot, per the raw buffer
/// convention.
pub fn parse_tick_list(text: &str) -> Result<Vec<u16>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .with_context(|| format!("Invalid tick value {:?}", s))
        })
        .collect()
}
