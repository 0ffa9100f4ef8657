//! Browser abstraction for page-level operations.
//!
//! Defines the `Browser` and `PageSession` traits that abstract over the
//! engine (Chromium via chromiumoxide). Everything the checker does to a
//! page — navigation, element probing, typing, capture — goes through
//! `PageSession`, so the sequencer can be exercised against a scripted
//! fake in tests.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;

/// A browser engine owning one session for the lifetime of a run.
///
/// The session is the single shared mutable resource of a batch: pages are
/// opened and closed per code, never shared across codes, and the whole
/// session is released at the batch boundary on every exit path.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a fresh page. Cookies persist at the session level, so a page
    /// opened after a login flow carries the authenticated session.
    async fn new_page(&self) -> Result<Box<dyn PageSession>>;
    /// Shut down the engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently open pages.
    fn open_pages(&self) -> usize;
}

/// A single live page.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate to a URL, waiting at most `timeout_ms` for the load.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()>;
    /// Execute JavaScript in the page and return its JSON result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Rendered visible text of the page body.
    async fn visible_text(&self) -> Result<String>;
    /// Full page HTML.
    async fn html(&self) -> Result<String>;
    /// Current URL.
    async fn url(&self) -> Result<String>;
    /// PNG screenshot of the viewport, for diagnostics.
    async fn screenshot(&self) -> Result<Vec<u8>>;
    /// Close this page.
    async fn close(self: Box<Self>) -> Result<()>;
}
