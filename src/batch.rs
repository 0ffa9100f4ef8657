//! Sequential batch driver.
//!
//! Codes are processed strictly one at a time: the browser session is a
//! single shared resource, and serializing items both avoids page-state
//! cross-talk and keeps the request rate polite. A fixed pause is inserted
//! between items (not before the first, not after the last). Output order
//! is input order, 1:1.

use crate::config::CheckerConfig;
use crate::record::OutcomeRecord;
use crate::retry::{self, CodeOperation};
use indicatif::{ProgressBar, ProgressStyle};

/// Run every code through `op` with bounded retries; collect one terminal
/// record per code, in input order.
pub async fn run_batch(
    op: &mut dyn CodeOperation,
    codes: &[String],
    cfg: &CheckerConfig,
    show_progress: bool,
) -> Vec<OutcomeRecord> {
    let bar = if show_progress && !codes.is_empty() {
        let bar = ProgressBar::new(codes.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut records = Vec::with_capacity(codes.len());

    for (index, code) in codes.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(cfg.per_item_delay).await;
        }

        let record = retry::with_retry(op, code, cfg.max_attempts, cfg.retry_delay).await;
        bar.set_message(format!("{} → {}", record.code, record.status));
        bar.inc(1);
        records.push(record);
    }

    bar.finish_and_clear();
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{OutcomeRecord, StatusCategory};
    use crate::sequencer::{Step, StepError};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Echoes each code back as a Valid record; fails codes listed in
    /// `failing` on every attempt.
    struct Scripted {
        failing: Vec<&'static str>,
        attempts: u32,
    }

    #[async_trait]
    impl CodeOperation for Scripted {
        async fn attempt(&mut self, code: &str) -> Result<OutcomeRecord, StepError> {
            self.attempts += 1;
            if self.failing.contains(&code) {
                return Err(StepError::ElementNotFound {
                    step: Step::LocateInput,
                });
            }
            Ok(OutcomeRecord::new(
                code,
                StatusCategory::Valid,
                None,
                None,
                format!("ok:{}", code),
            ))
        }
    }

    fn fast_config() -> CheckerConfig {
        CheckerConfig {
            per_item_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
            max_attempts: 2,
            ..CheckerConfig::default()
        }
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_output_order_matches_input() {
        let mut op = Scripted {
            failing: vec![],
            attempts: 0,
        };
        let input = codes(&["AAAA11112222", "BBBB33334444", "CCCC55556666"]);
        let records = run_batch(&mut op, &input, &fast_config(), false).await;

        assert_eq!(records.len(), input.len());
        assert_eq!(records[0].message, "ok:AAAA11112222");
        assert_eq!(records[1].message, "ok:BBBB33334444");
        assert_eq!(records[2].message, "ok:CCCC55556666");
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let mut op = Scripted {
            failing: vec!["BBBB33334444"],
            attempts: 0,
        };
        let input = codes(&["AAAA11112222", "BBBB33334444", "CCCC55556666"]);
        let records = run_batch(&mut op, &input, &fast_config(), false).await;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].status, StatusCategory::Valid);
        assert_eq!(records[1].status, StatusCategory::TransientError);
        assert_eq!(records[2].status, StatusCategory::Valid);
        // Failing item consumed max_attempts, the others one each.
        assert_eq!(op.attempts, 1 + 2 + 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let mut op = Scripted {
            failing: vec![],
            attempts: 0,
        };
        let records = run_batch(&mut op, &[], &fast_config(), false).await;
        assert!(records.is_empty());
        assert_eq!(op.attempts, 0);
    }
}
