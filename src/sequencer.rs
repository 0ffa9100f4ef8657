//! Fixed action sequence for one code: navigate, fill, submit, capture.
//!
//! Each step carries the configured per-step timeout and no rollback. Any
//! step that cannot complete fails with a `StepError` naming the step and
//! the underlying cause; the capture is all-or-nothing. Failures are
//! absorbed by the retry wrapper, never by this module.

use crate::classify::selector_candidates;
use crate::config::CheckerConfig;
use crate::probe;
use crate::renderer::PageSession;
use std::time::Duration;
use thiserror::Error;

/// The steps of the sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Navigate,
    Quiesce,
    LocateInput,
    TypeCode,
    Submit,
    Settle,
    Capture,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Navigate => "navigate",
            Self::Quiesce => "quiesce",
            Self::LocateInput => "locate-input",
            Self::TypeCode => "type-code",
            Self::Submit => "submit",
            Self::Settle => "settle",
            Self::Capture => "capture",
        };
        f.write_str(name)
    }
}

/// Typed failure of a sequencer step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("no locator candidate resolved during {step}")]
    ElementNotFound { step: Step },

    #[error("navigation to {url} timed out or failed: {cause}")]
    NavigationTimeout { url: String, cause: String },

    #[error("submission could not be confirmed")]
    SubmissionFailure,

    #[error("redemption requires an authenticated session")]
    AuthenticationRequired,

    #[error("login was rejected by the site")]
    AuthenticationFailed,

    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: anyhow::Error,
    },
}

/// Bound a page operation by the per-step timeout.
///
/// A hung CDP evaluate (busy script, dead target) must not wedge the
/// attempt: elapse becomes a retriable `StepError` naming the step, the
/// same way navigation wraps `goto`.
pub(crate) async fn bounded<T>(
    step: Step,
    limit: Duration,
    fut: impl std::future::Future<Output = anyhow::Result<T>>,
) -> Result<T, StepError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(StepError::Step { step, source }),
        Err(_) => Err(StepError::Step {
            step,
            source: anyhow::anyhow!("timed out after {}ms", limit.as_millis()),
        }),
    }
}

/// Rendered text and raw markup captured after submission.
#[derive(Debug, Clone)]
pub struct PageCapture {
    pub text: String,
    pub html: String,
}

/// Selector list used when every configured input candidate failed.
const FIRST_TEXT_INPUT: &[&str] = &["input[type='text']", "input:not([type])"];

/// Execute the fixed step chain for one code and capture the result page.
pub async fn execute(
    page: &mut dyn PageSession,
    cfg: &CheckerConfig,
    target_url: &str,
    code: &str,
) -> Result<PageCapture, StepError> {
    let timeout_ms = cfg.step_timeout.as_millis() as u64;

    // Navigate; quiescence is a fixed window since network-idle detection
    // is unreliable on storefronts that long-poll.
    page.navigate(target_url, timeout_ms)
        .await
        .map_err(|e| StepError::NavigationTimeout {
            url: target_url.to_string(),
            cause: format!("{e:#}"),
        })?;
    tokio::time::sleep(quiesce_window(cfg.settle_delay)).await;

    // Locate the code input, falling back to the first text input.
    let limit = cfg.step_timeout;
    let input_selector = match bounded(
        Step::LocateInput,
        limit,
        probe::locate(page, selector_candidates("code_input")),
    )
    .await?
    {
        Some(hit) => hit.selector,
        None => {
            let fallback: Vec<String> = FIRST_TEXT_INPUT.iter().map(|s| s.to_string()).collect();
            match bounded(Step::LocateInput, limit, probe::locate(page, &fallback)).await? {
                Some(hit) => {
                    tracing::warn!(selector = %hit.selector, "no configured input candidate resolved, using first text input");
                    hit.selector
                }
                None => return Err(StepError::ElementNotFound { step: Step::LocateInput }),
            }
        }
    };

    // Click, then type the code.
    bounded(Step::TypeCode, limit, probe::click(page, &input_selector)).await?;
    let typed = bounded(
        Step::TypeCode,
        limit,
        probe::type_into(page, &input_selector, code),
    )
    .await?;
    if !typed {
        return Err(StepError::ElementNotFound { step: Step::TypeCode });
    }

    // Submit via a located control, else the keyboard-level default action.
    let submitted = match bounded(
        Step::Submit,
        limit,
        probe::locate(page, selector_candidates("submit_control")),
    )
    .await?
    {
        Some(hit) => bounded(Step::Submit, limit, probe::click(page, &hit.selector)).await?,
        None => {
            bounded(
                Step::Submit,
                limit,
                probe::press_enter(page, &input_selector),
            )
            .await?
        }
    };
    if !submitted {
        return Err(StepError::SubmissionFailure);
    }

    // Settle, then capture text and markup together.
    tokio::time::sleep(cfg.settle_delay).await;

    let text = bounded(Step::Capture, limit, page.visible_text()).await?;
    let html = bounded(Step::Capture, limit, page.html()).await?;

    Ok(PageCapture { text, html })
}

/// Post-navigation quiescence window: half the settle delay, at least 500ms.
fn quiesce_window(settle: Duration) -> Duration {
    (settle / 2).max(Duration::from_millis(500))
}
