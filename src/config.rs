//! Runtime configuration for a checker run.
//!
//! All knobs are surfaced as CLI flags; defaults match the values the tool
//! ships with. The region selects both the target storefront URLs and which
//! amount-pattern list the classifier tries first.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Storefront region. Affects target URLs and amount-pattern priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Chinese storefront (`¥` / `元` amount formats tried first).
    Cn,
    /// US storefront (`$` amount format tried first).
    Us,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cn => "cn",
            Self::Us => "us",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one batch run.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Storefront region.
    pub region: Region,
    /// Run the browser with a visible window instead of headless.
    pub headed: bool,
    /// Pause between batch items. Not applied before the first item.
    pub per_item_delay: Duration,
    /// Total attempts per code (first try included).
    pub max_attempts: u32,
    /// Timeout applied to each sequencer step.
    pub step_timeout: Duration,
    /// Fixed wait after submission before the page is captured.
    pub settle_delay: Duration,
    /// Delay between retry attempts.
    pub retry_delay: Duration,
    /// Capture a page snapshot (screenshot + HTML) when an attempt fails.
    pub snapshot_on_error: bool,
    /// Directory for diagnostic snapshots.
    pub snapshot_dir: PathBuf,
    /// Override for the target URL; when `None`, the region default from the
    /// embedded pattern config is used.
    pub url_override: Option<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            region: Region::Cn,
            headed: false,
            per_item_delay: Duration::from_millis(3000),
            max_attempts: 3,
            step_timeout: Duration::from_millis(30_000),
            settle_delay: Duration::from_millis(2000),
            retry_delay: Duration::from_millis(5000),
            snapshot_on_error: false,
            snapshot_dir: PathBuf::from("cardprobe-diagnostics"),
            url_override: None,
        }
    }
}
