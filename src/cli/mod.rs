//! CLI subcommand implementations for the cardprobe binary.

pub mod check_cmd;
pub mod doctor;
pub mod output;
pub mod redeem_cmd;

use crate::config::{CheckerConfig, Region};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Options shared by the `check` and `redeem` subcommands.
#[derive(Debug, Args)]
pub struct RunOptions {
    /// Gift card codes to process
    pub codes: Vec<String>,

    /// Read codes from a delimited file (first column, header skipped)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Storefront region
    #[arg(long, value_enum, default_value_t = Region::Cn)]
    pub region: Region,

    /// Run the browser with a visible window
    #[arg(long)]
    pub headed: bool,

    /// Pause between codes in milliseconds
    #[arg(long, default_value = "3000")]
    pub delay: u64,

    /// Total attempts per code
    #[arg(long, default_value = "3")]
    pub retries: u32,

    /// Per-step timeout in milliseconds
    #[arg(long, default_value = "30000")]
    pub timeout: u64,

    /// Settle window after submission in milliseconds
    #[arg(long, default_value = "2000")]
    pub settle: u64,

    /// Capture a page snapshot when an attempt fails
    #[arg(long)]
    pub snapshot_on_error: bool,

    /// Override the target URL (defaults to the region's storefront)
    #[arg(long)]
    pub url: Option<String>,

    /// Output file stem; writes <stem>.json and <stem>.csv
    #[arg(long, default_value = "cardprobe-results")]
    pub output: PathBuf,
}

impl RunOptions {
    /// Build the checker configuration from the parsed flags.
    pub fn to_config(&self) -> CheckerConfig {
        CheckerConfig {
            region: self.region,
            headed: self.headed,
            per_item_delay: Duration::from_millis(self.delay),
            max_attempts: self.retries,
            step_timeout: Duration::from_millis(self.timeout),
            settle_delay: Duration::from_millis(self.settle),
            retry_delay: Duration::from_millis(self.delay.max(1000)),
            snapshot_on_error: self.snapshot_on_error,
            snapshot_dir: PathBuf::from("cardprobe-diagnostics"),
            url_override: self.url.clone(),
        }
    }

    /// Reject malformed flag values before any browser work starts.
    pub fn validate(&self) -> anyhow::Result<()> {
        use anyhow::Context;
        if let Some(u) = &self.url {
            url::Url::parse(u).with_context(|| format!("invalid --url '{u}'"))?;
        }
        Ok(())
    }

    /// Collect codes from positional arguments and the optional file.
    pub fn collect_codes(&self) -> anyhow::Result<Vec<String>> {
        let mut codes: Vec<String> = self
            .codes
            .iter()
            .filter(|c| c.chars().count() >= 8)
            .cloned()
            .collect();
        if codes.len() < self.codes.len() {
            tracing::warn!(
                dropped = self.codes.len() - codes.len(),
                "dropped short code arguments"
            );
        }
        if let Some(path) = &self.file {
            codes.extend(crate::input::load_codes_from_file(path)?);
        }
        Ok(codes)
    }
}
