//! Chromium engine via chromiumoxide.

use super::{Browser, PageSession};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. CARDPROBE_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("CARDPROBE_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.cardprobe/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".cardprobe/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".cardprobe/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".cardprobe/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".cardprobe/chromium/chrome-linux64/chrome"),
                home.join(".cardprobe/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-backed browser session.
pub struct ChromiumBrowser {
    browser: CdpBrowser,
    open_count: Arc<AtomicUsize>,
}

impl ChromiumBrowser {
    /// Launch a Chromium instance. `headed` opens a visible window; the
    /// default is the new headless mode.
    ///
    /// Launch failure is the one fatal error class of a run — callers let
    /// it propagate to process exit.
    pub async fn launch(headed: bool) -> Result<Self> {
        let chrome_path = find_chromium()
            .context("Chromium not found. Set CARDPROBE_CHROMIUM_PATH or install Chrome.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--lang=zh-CN,zh,en");
        if headed {
            builder = builder.with_head();
        } else {
            builder = builder.arg("--headless=new");
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Drain CDP events for the life of the browser
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            open_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn new_page(&self) -> Result<Box<dyn PageSession>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;

        self.open_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumPage {
            page,
            open_count: Arc::clone(&self.open_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        // Browser process exits when ChromiumBrowser is dropped
        Ok(())
    }

    fn open_pages(&self) -> usize {
        self.open_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page.
pub struct ChromiumPage {
    page: Page,
    open_count: Arc<AtomicUsize>,
}

#[async_trait]
impl PageSession for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()> {
        let result = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn visible_text(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .context("failed to read page text")?;

        let text: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert text result: {e:?}"))?;
        Ok(text)
    }

    async fn html(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?;

        let html: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert HTML result: {e:?}"))?;
        Ok(html)
    }

    async fn url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        self.page
            .screenshot(params)
            .await
            .context("failed to capture screenshot")
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.open_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_navigate_and_capture() {
        let browser = ChromiumBrowser::launch(false)
            .await
            .expect("failed to launch browser");
        let mut page = browser.new_page().await.expect("failed to open page");

        page.navigate("data:text/html,<h1>Balance</h1><p>¥88.00</p>", 10_000)
            .await
            .expect("navigation failed");

        let text = page.visible_text().await.expect("text capture failed");
        assert!(text.contains("Balance"));

        let html = page.html().await.expect("html capture failed");
        assert!(html.contains("<h1>Balance</h1>"));

        page.close().await.expect("close failed");
        assert_eq!(browser.open_pages(), 0);

        browser.shutdown().await.expect("shutdown failed");
    }
}
