//! End-to-end pipeline tests against a scripted fake browser.
//!
//! These cover the full chain — batch driver, retry wrapper, sequencer,
//! probe runner, classifier — without a real Chromium: the fake page
//! resolves the shipped selectors and answers with canned result text per
//! typed code.

use async_trait::async_trait;
use cardprobe::batch::run_batch;
use cardprobe::checker::LookupOperation;
use cardprobe::config::CheckerConfig;
use cardprobe::probe::sanitize_js_string;
use cardprobe::record::StatusCategory;
use cardprobe::renderer::{Browser, PageSession};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Browser that serves canned result text keyed by the code typed into the
/// form. Pages resolve the shipped `code_input` / `submit_control`
/// selectors.
struct FakeBrowser {
    responses: Arc<HashMap<String, String>>,
    open: Arc<AtomicUsize>,
    fail_navigation: bool,
}

impl FakeBrowser {
    fn new(responses: &[(&str, &str)]) -> Self {
        Self {
            responses: Arc::new(
                responses
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            open: Arc::new(AtomicUsize::new(0)),
            fail_navigation: false,
        }
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_page(&self) -> anyhow::Result<Box<dyn PageSession>> {
        self.open.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(FakePage {
            responses: Arc::clone(&self.responses),
            typed: Mutex::new(None),
            open: Arc::clone(&self.open),
            fail_navigation: self.fail_navigation,
        }))
    }
    async fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
    fn open_pages(&self) -> usize {
        self.open.load(Ordering::Relaxed)
    }
}

struct FakePage {
    responses: Arc<HashMap<String, String>>,
    typed: Mutex<Option<String>>,
    open: Arc<AtomicUsize>,
    fail_navigation: bool,
}

const RESOLVABLE: &[&str] = &["input[name='giftCardCode']", "button[type='submit']"];

#[async_trait]
impl PageSession for FakePage {
    async fn navigate(&mut self, _url: &str, _timeout_ms: u64) -> anyhow::Result<()> {
        if self.fail_navigation {
            anyhow::bail!("navigation timed out");
        }
        Ok(())
    }

    async fn execute_js(&self, script: &str) -> anyhow::Result<serde_json::Value> {
        let resolvable = |script: &str| {
            RESOLVABLE
                .iter()
                .any(|sel| script.contains(&sanitize_js_string(sel)))
        };
        if script.contains("querySelectorAll") {
            return Ok(serde_json::json!(if resolvable(script) { 1 } else { 0 }));
        }
        if let Some(start) = script.find("el.value = '") {
            let rest = &script[start + "el.value = '".len()..];
            let value = rest.split('\'').next().unwrap_or("").to_string();
            *self.typed.lock().unwrap() = Some(value);
            return Ok(serde_json::json!(true));
        }
        if script.contains("el.click()") || script.contains("KeyboardEvent") {
            return Ok(serde_json::json!(resolvable(script)));
        }
        Ok(serde_json::json!(null))
    }

    async fn visible_text(&self) -> anyhow::Result<String> {
        let typed = self.typed.lock().unwrap().clone().unwrap_or_default();
        Ok(self
            .responses
            .get(&typed)
            .cloned()
            .unwrap_or_else(|| "页面加载中".to_string()))
    }

    async fn html(&self) -> anyhow::Result<String> {
        Ok("<html><body></body></html>".to_string())
    }

    async fn url(&self) -> anyhow::Result<String> {
        Ok("about:blank".to_string())
    }

    async fn screenshot(&self) -> anyhow::Result<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        self.open.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }
}

fn fast_config() -> CheckerConfig {
    CheckerConfig {
        per_item_delay: Duration::ZERO,
        retry_delay: Duration::ZERO,
        settle_delay: Duration::from_millis(1),
        max_attempts: 2,
        ..CheckerConfig::default()
    }
}

#[tokio::test]
async fn full_lookup_batch_classifies_each_code() {
    let browser = FakeBrowser::new(&[
        ("VALIDCODE001", "您的礼品卡余额为 ¥88.00"),
        ("USEDCODE0002", "抱歉，该卡已兑换"),
        ("BADCODE00003", "卡号无效，请重新输入"),
        ("WEIRDCODE004", "服务暂不可用"),
    ]);
    let cfg = fast_config();
    let codes: Vec<String> = [
        "VALIDCODE001",
        "USEDCODE0002",
        "BADCODE00003",
        "WEIRDCODE004",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let mut op = LookupOperation::new(&browser, &cfg);
    let records = run_batch(&mut op, &codes, &cfg, false).await;

    assert_eq!(records.len(), 4);
    assert_eq!(records[0].status, StatusCategory::Valid);
    assert_eq!(records[0].amount.as_deref(), Some("88.00"));
    assert_eq!(records[0].currency.as_deref(), Some("¥"));
    assert_eq!(records[1].status, StatusCategory::AlreadyRedeemed);
    assert_eq!(records[2].status, StatusCategory::Invalid);
    assert_eq!(records[3].status, StatusCategory::Unknown);

    // Records are masked, ordered 1:1 with input, and every page was closed.
    assert_eq!(records[0].code, "VALI****E001");
    assert_eq!(browser.open_pages(), 0);
}

#[tokio::test]
async fn navigation_failures_become_transient_records() {
    let mut browser = FakeBrowser::new(&[]);
    browser.fail_navigation = true;
    let cfg = fast_config();
    let codes = vec!["AAAA11112222".to_string(), "BBBB33334444".to_string()];

    let mut op = LookupOperation::new(&browser, &cfg);
    let records = run_batch(&mut op, &codes, &cfg, false).await;

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.status, StatusCategory::TransientError);
        assert!(record.message.contains("navigation"));
    }
    assert_eq!(browser.open_pages(), 0);
}

#[tokio::test]
async fn report_written_end_to_end() {
    use cardprobe::config::Region;
    use cardprobe::output::{write_delimited, write_json_report, Report};

    let browser = FakeBrowser::new(&[("VALIDCODE001", "Your balance is $25.00")]);
    let cfg = CheckerConfig {
        region: Region::Us,
        ..fast_config()
    };
    let codes = vec!["VALIDCODE001".to_string()];

    let mut op = LookupOperation::new(&browser, &cfg);
    let records = run_batch(&mut op, &codes, &cfg, false).await;

    let dir = tempfile::tempdir().unwrap();
    let report = Report::new(cfg.region, &records);
    let json_path = dir.path().join("report.json");
    let csv_path = dir.path().join("report.csv");
    write_json_report(&json_path, &report).unwrap();
    write_delimited(&csv_path, &records).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed["metadata"]["counts"]["valid"], 1);
    assert_eq!(parsed["results"][0]["amount"], "25.00");
    assert_eq!(parsed["results"][0]["currency"], "$");

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.contains("\"VALI****E001\",\"valid\",\"25.00\",\"$\""));
}
