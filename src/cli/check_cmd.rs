//! `cardprobe check` — look up balances for a batch of codes.

use super::{output, RunOptions};
use crate::batch;
use crate::checker::LookupOperation;
use crate::output::{write_delimited, write_json_report, Report};
use crate::record::OutcomeRecord;
use crate::renderer::chromium::ChromiumBrowser;
use crate::renderer::Browser;
use anyhow::{bail, Context, Result};

/// Run the check command.
pub async fn run(options: &RunOptions) -> Result<()> {
    options.validate()?;
    let codes = options.collect_codes()?;
    if codes.is_empty() {
        bail!("no codes to check; pass codes as arguments or with --file");
    }

    let cfg = options.to_config();
    tracing::info!(count = codes.len(), region = %cfg.region, "starting balance check");

    // Browser launch failure is the one fatal error of a run.
    let browser = ChromiumBrowser::launch(cfg.headed)
        .await
        .context("cannot start the browser session")?;

    let mut op = LookupOperation::new(&browser, &cfg);
    let show_progress = !output::is_quiet() && !output::is_json();
    let records = batch::run_batch(&mut op, &codes, &cfg, show_progress).await;

    // Release the session before touching the filesystem.
    browser.shutdown().await?;

    let report = Report::new(cfg.region, &records);
    let json_path = options.output.with_extension("json");
    let csv_path = options.output.with_extension("csv");
    write_json_report(&json_path, &report)?;
    write_delimited(&csv_path, &records)?;

    if output::is_json() {
        output::print_json(&serde_json::to_value(&report)?);
    } else if !output::is_quiet() {
        print_summary(&records);
        println!(
            "\nWrote {} and {}",
            json_path.display(),
            csv_path.display()
        );
    }

    Ok(())
}

/// Human-readable per-code summary table.
pub fn print_summary(records: &[OutcomeRecord]) {
    println!();
    for record in records {
        let amount = match (&record.amount, &record.currency) {
            (Some(a), Some(c)) => format!("{c}{a}"),
            _ => "-".to_string(),
        };
        println!(
            "  {}  {:<17} {:>10}  {}",
            record.code, record.status, amount, record.message
        );
    }
}
