//! `cardprobe redeem` — redeem a batch of codes into the signed-in account.

use super::{output, RunOptions};
use crate::auth::{self, Credentials};
use crate::batch;
use crate::checker::RedeemOperation;
use crate::output::{write_delimited, write_json_report, Report};
use crate::renderer::chromium::ChromiumBrowser;
use crate::renderer::Browser;
use anyhow::{bail, Context, Result};

/// Run the redeem command.
pub async fn run(options: &RunOptions) -> Result<()> {
    options.validate()?;
    let codes = options.collect_codes()?;
    if codes.is_empty() {
        bail!("no codes to redeem; pass codes as arguments or with --file");
    }

    // Fail fast when credentials are absent, before any browser work.
    let credentials = Credentials::from_env().map_err(|_| {
        anyhow::anyhow!(
            "redemption requires credentials; set CARDPROBE_USERNAME and \
             CARDPROBE_PASSWORD_FILE (or CARDPROBE_PASSWORD)"
        )
    })?;

    let cfg = options.to_config();
    tracing::info!(count = codes.len(), region = %cfg.region, "starting redemption");

    let browser = ChromiumBrowser::launch(cfg.headed)
        .await
        .context("cannot start the browser session")?;

    // Login happens once; its cookies carry over to every redemption page.
    if let Err(e) = auth::login(&browser, &cfg, &credentials).await {
        let _ = browser.shutdown().await;
        bail!("login failed: {e}");
    }

    let mut op = RedeemOperation::new(&browser, &cfg);
    let show_progress = !output::is_quiet() && !output::is_json();
    let records = batch::run_batch(&mut op, &codes, &cfg, show_progress).await;

    browser.shutdown().await?;

    let report = Report::new(cfg.region, &records);
    let json_path = options.output.with_extension("json");
    let csv_path = options.output.with_extension("csv");
    write_json_report(&json_path, &report)?;
    write_delimited(&csv_path, &records)?;

    if output::is_json() {
        output::print_json(&serde_json::to_value(&report)?);
    } else if !output::is_quiet() {
        super::check_cmd::print_summary(&records);
        println!(
            "\nWrote {} and {}",
            json_path.display(),
            csv_path.display()
        );
    }

    Ok(())
}
