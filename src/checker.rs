//! Concrete lookup and redemption operations over a live browser session.
//!
//! Each attempt opens a fresh page, runs the action sequence, classifies
//! the capture, and closes the page — pages are never shared across codes.
//! On a failed attempt a best-effort diagnostic snapshot (screenshot +
//! HTML) is written before the page closes; snapshot failures are logged
//! and swallowed, never escalated.

use crate::classify::{self, Operation};
use crate::config::CheckerConfig;
use crate::record::{mask, OutcomeRecord};
use crate::renderer::{Browser, PageSession};
use crate::retry::CodeOperation;
use crate::sequencer::{self, StepError};
use async_trait::async_trait;

/// Balance lookup pipeline.
pub struct LookupOperation<'a> {
    browser: &'a dyn Browser,
    cfg: &'a CheckerConfig,
    target_url: String,
}

impl<'a> LookupOperation<'a> {
    pub fn new(browser: &'a dyn Browser, cfg: &'a CheckerConfig) -> Self {
        let target_url = cfg
            .url_override
            .clone()
            .unwrap_or_else(|| classify::region_config(cfg.region).lookup_url.clone());
        Self {
            browser,
            cfg,
            target_url,
        }
    }
}

#[async_trait]
impl CodeOperation for LookupOperation<'_> {
    async fn attempt(&mut self, code: &str) -> Result<OutcomeRecord, StepError> {
        run_attempt(
            self.browser,
            self.cfg,
            &self.target_url,
            code,
            Operation::Lookup,
        )
        .await
    }
}

/// Redemption pipeline. Requires a prior `auth::login` on the same browser
/// session; the authenticated cookies carry over to pages opened here.
pub struct RedeemOperation<'a> {
    browser: &'a dyn Browser,
    cfg: &'a CheckerConfig,
    target_url: String,
}

impl<'a> RedeemOperation<'a> {
    pub fn new(browser: &'a dyn Browser, cfg: &'a CheckerConfig) -> Self {
        let target_url = cfg
            .url_override
            .clone()
            .unwrap_or_else(|| classify::region_config(cfg.region).redeem_url.clone());
        Self {
            browser,
            cfg,
            target_url,
        }
    }
}

#[async_trait]
impl CodeOperation for RedeemOperation<'_> {
    async fn attempt(&mut self, code: &str) -> Result<OutcomeRecord, StepError> {
        run_attempt(
            self.browser,
            self.cfg,
            &self.target_url,
            code,
            Operation::Redemption,
        )
        .await
    }
}

/// One full attempt: open page, sequence, classify, close.
async fn run_attempt(
    browser: &dyn Browser,
    cfg: &CheckerConfig,
    target_url: &str,
    code: &str,
    operation: Operation,
) -> Result<OutcomeRecord, StepError> {
    let mut page = browser
        .new_page()
        .await
        .map_err(|e| StepError::Step {
            step: sequencer::Step::Navigate,
            source: e,
        })?;

    let result = sequencer::execute(page.as_mut(), cfg, target_url, code).await;

    let record = match result {
        Ok(capture) => {
            let classification =
                classify::classify(&capture.text, &capture.html, cfg.region, operation);
            tracing::info!(
                code = %mask(code),
                status = %classification.status,
                "classified"
            );
            Ok(OutcomeRecord::new(
                code,
                classification.status,
                classification.amount,
                classification.currency,
                classification.message,
            ))
        }
        Err(e) => {
            if cfg.snapshot_on_error {
                snapshot_page(page.as_ref(), cfg, code).await;
            }
            Err(e)
        }
    };

    if let Err(e) = page.close().await {
        tracing::debug!(error = %e, "page close failed");
    }

    record
}

/// Best-effort diagnostic snapshot of the failed page. Never escalates.
async fn snapshot_page(page: &dyn PageSession, cfg: &CheckerConfig, code: &str) {
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let stem = format!("{}-{stamp}", mask(code).replace('*', "x"));

    if let Err(e) = std::fs::create_dir_all(&cfg.snapshot_dir) {
        tracing::debug!(error = %e, "could not create snapshot dir");
        return;
    }

    match page.screenshot().await {
        Ok(png) => {
            let path = cfg.snapshot_dir.join(format!("{stem}.png"));
            if let Err(e) = std::fs::write(&path, png) {
                tracing::debug!(error = %e, "could not write snapshot screenshot");
            }
        }
        Err(e) => tracing::debug!(error = %e, "could not capture snapshot screenshot"),
    }

    match page.html().await {
        Ok(html) => {
            let path = cfg.snapshot_dir.join(format!("{stem}.html"));
            if let Err(e) = std::fs::write(&path, html) {
                tracing::debug!(error = %e, "could not write snapshot html");
            }
        }
        Err(e) => tracing::debug!(error = %e, "could not capture snapshot html"),
    }
}
