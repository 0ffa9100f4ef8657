//! Retailer login for the redemption path.
//!
//! Redemption requires an authenticated storefront session. Credentials are
//! loaded from the environment; the password can come from a file so it
//! stays out of the process list. The login flow reuses the probe runner
//! for the form fields and verifies success by probing for a logged-in
//! marker element.

use crate::classify::{region_config, selector_candidates};
use crate::config::CheckerConfig;
use crate::probe;
use crate::renderer::Browser;
use crate::sequencer::StepError;
use anyhow::Context;

/// Storefront account credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Load credentials from the environment.
    ///
    /// Password priority:
    /// 1. `CARDPROBE_PASSWORD_FILE` — read from file (not visible in ps)
    /// 2. `CARDPROBE_PASSWORD` — env value directly
    ///
    /// Missing credentials map to `AuthenticationRequired` so the caller
    /// can fail the whole redemption run up front.
    pub fn from_env() -> Result<Self, StepError> {
        let username = match std::env::var("CARDPROBE_USERNAME") {
            Ok(u) if !u.is_empty() => u,
            _ => return Err(StepError::AuthenticationRequired),
        };

        if let Ok(path) = std::env::var("CARDPROBE_PASSWORD_FILE") {
            let password = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read password file at '{path}'"))
                .map_err(|_| StepError::AuthenticationRequired)?;
            let password = password.trim_end_matches(['\r', '\n']).to_string();
            if password.is_empty() {
                return Err(StepError::AuthenticationRequired);
            }
            return Ok(Self { username, password });
        }

        match std::env::var("CARDPROBE_PASSWORD") {
            Ok(p) if !p.is_empty() => Ok(Self {
                username,
                password: p,
            }),
            _ => Err(StepError::AuthenticationRequired),
        }
    }
}

/// Log in once on the shared browser session.
///
/// Cookies persist at the session level, so pages opened afterwards carry
/// the authenticated state. The login page itself is closed before return.
pub async fn login(
    browser: &dyn Browser,
    cfg: &CheckerConfig,
    credentials: &Credentials,
) -> Result<(), StepError> {
    let login_url = &region_config(cfg.region).login_url;
    let timeout_ms = cfg.step_timeout.as_millis() as u64;

    let mut page = browser.new_page().await.map_err(|e| StepError::Step {
        step: crate::sequencer::Step::Navigate,
        source: e,
    })?;

    let result = login_on_page(page.as_mut(), cfg, login_url, timeout_ms, credentials).await;

    if let Err(e) = page.close().await {
        tracing::debug!(error = %e, "login page close failed");
    }
    result
}

async fn login_on_page(
    page: &mut dyn crate::renderer::PageSession,
    cfg: &CheckerConfig,
    login_url: &str,
    timeout_ms: u64,
    credentials: &Credentials,
) -> Result<(), StepError> {
    page.navigate(login_url, timeout_ms)
        .await
        .map_err(|e| StepError::NavigationTimeout {
            url: login_url.to_string(),
            cause: format!("{e:#}"),
        })?;
    tokio::time::sleep(cfg.settle_delay).await;

    use crate::sequencer::{bounded, Step};
    let limit = cfg.step_timeout;

    let username_field = bounded(
        Step::LocateInput,
        limit,
        probe::locate(page, selector_candidates("login_username")),
    )
    .await?
    .ok_or(StepError::AuthenticationFailed)?;
    let password_field = bounded(
        Step::LocateInput,
        limit,
        probe::locate(page, selector_candidates("login_password")),
    )
    .await?
    .ok_or(StepError::AuthenticationFailed)?;

    bounded(
        Step::TypeCode,
        limit,
        probe::type_into(page, &username_field.selector, &credentials.username),
    )
    .await?;
    bounded(
        Step::TypeCode,
        limit,
        probe::type_into(page, &password_field.selector, &credentials.password),
    )
    .await?;

    let submitted = match bounded(
        Step::Submit,
        limit,
        probe::locate(page, selector_candidates("login_submit")),
    )
    .await?
    {
        Some(hit) => bounded(Step::Submit, limit, probe::click(page, &hit.selector)).await?,
        None => {
            bounded(
                Step::Submit,
                limit,
                probe::press_enter(page, &password_field.selector),
            )
            .await?
        }
    };
    if !submitted {
        return Err(StepError::AuthenticationFailed);
    }

    tokio::time::sleep(cfg.settle_delay).await;

    // Success check: a logged-in marker must be present after the redirect.
    match bounded(
        Step::LocateInput,
        limit,
        probe::locate(page, selector_candidates("logged_in_marker")),
    )
    .await?
    {
        Some(_) => {
            tracing::info!("login succeeded");
            Ok(())
        }
        None => Err(StepError::AuthenticationFailed),
    }
}
