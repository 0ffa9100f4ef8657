//! Code list loading.
//!
//! Codes arrive either directly as CLI arguments or from a two-column
//! delimited text file (comma or tab): first column is the code, the first
//! line is a header and is skipped. Malformed or too-short tokens are
//! dropped silently from the result, with an aggregate warning.

use anyhow::{Context, Result};
use std::path::Path;

/// Minimum plausible code length; shorter tokens are dropped.
const MIN_CODE_LEN: usize = 8;

/// Load codes from a delimited text file.
pub fn load_codes_from_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read code file '{}'", path.display()))?;
    Ok(parse_code_lines(&content))
}

/// Parse file content into codes. Header line skipped, first column taken,
/// short/empty tokens dropped.
fn parse_code_lines(content: &str) -> Vec<String> {
    let mut dropped = 0usize;
    let codes: Vec<String> = content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let first = line.split([',', '\t']).next().unwrap_or("").trim();
            if first.chars().count() >= MIN_CODE_LEN {
                Some(first.to_string())
            } else {
                if !line.trim().is_empty() {
                    dropped += 1;
                }
                None
            }
        })
        .collect();

    if dropped > 0 {
        tracing::warn!(dropped, "dropped malformed or short code tokens");
    }
    codes
}
