//! Bounded retry around the action+classify pipeline.
//!
//! Every step-level failure is absorbed here: the wrapper re-invokes the
//! operation after a fixed delay, up to `max_attempts` total tries, then
//! emits a terminal `TransientError` record carrying the last error's
//! message. The raw failure never reaches the caller. Retrying is an
//! explicit counted loop, not re-entrant recursion.

use crate::record::{mask, OutcomeRecord};
use crate::sequencer::StepError;
use async_trait::async_trait;
use std::time::Duration;

/// One attemptable code operation (lookup or redemption).
///
/// The batch driver and retry wrapper only see this seam, so tests can
/// substitute a scripted implementation.
#[async_trait]
pub trait CodeOperation: Send {
    /// Run the full pipeline for `code` once. A returned record is terminal
    /// for this attempt; an error is retriable.
    async fn attempt(&mut self, code: &str) -> Result<OutcomeRecord, StepError>;
}

/// Invoke `op` for `code` until it succeeds or `max_attempts` is exhausted.
///
/// Waits `delay` between attempts (not after the last). Always returns a
/// record: on exhaustion, a `TransientError` record with the final error.
pub async fn with_retry(
    op: &mut dyn CodeOperation,
    code: &str,
    max_attempts: u32,
    delay: Duration,
) -> OutcomeRecord {
    let attempts = max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match op.attempt(code).await {
            Ok(record) => {
                if attempt > 1 {
                    tracing::info!(code = %mask(code), attempt, "attempt succeeded after retry");
                }
                return record;
            }
            Err(e) => {
                last_error = e.to_string();
                tracing::warn!(
                    code = %mask(code),
                    attempt,
                    max_attempts = attempts,
                    error = %last_error,
                    "attempt failed"
                );
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    OutcomeRecord::transient(code, last_error)
}
