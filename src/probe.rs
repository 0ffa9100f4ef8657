//! Prioritized selector probing and element interaction.
//!
//! The retailer's markup changes without notice, so every element the
//! checker needs is described by an ordered list of candidate CSS selectors.
//! `locate` tries them in listed order and short-circuits on the first that
//! resolves to a live element. "Nothing matched" is a reportable condition
//! (`Ok(None)`), not an error — callers apply their own fallback, e.g.
//! "use the first text input on the page".
//!
//! All interaction runs as JavaScript in the page context. Selector and
//! value strings are sanitized before injection so they can never break out
//! of a JS string literal.

use crate::renderer::PageSession;
use anyhow::Result;

/// A candidate selector that resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHit {
    /// The selector expression that matched.
    pub selector: String,
    /// How many elements it matched; interactions use the first.
    pub matches: u64,
}

/// Try each candidate selector in order; return the first that resolves.
///
/// Read-only: probing never mutates the DOM.
pub async fn locate(page: &dyn PageSession, candidates: &[String]) -> Result<Option<ProbeHit>> {
    for selector in candidates {
        let js = format!(
            "document.querySelectorAll('{}').length",
            sanitize_js_string(selector)
        );
        let count = page.execute_js(&js).await?.as_u64().unwrap_or(0);
        if count > 0 {
            tracing::debug!(selector, count, "locator candidate resolved");
            return Ok(Some(ProbeHit {
                selector: selector.clone(),
                matches: count,
            }));
        }
    }
    Ok(None)
}

/// Click the first element matching `selector`. Returns whether an element
/// was found and clicked.
pub async fn click(page: &dyn PageSession, selector: &str) -> Result<bool> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector('{}');
            if (el) {{ el.click(); return true; }}
            return false;
        }})()"#,
        sanitize_js_string(selector)
    );
    Ok(page.execute_js(&js).await?.as_bool().unwrap_or(false))
}

/// Focus the first element matching `selector` and set its value, firing
/// `input` and `change` events so framework-bound forms notice.
pub async fn type_into(page: &dyn PageSession, selector: &str, value: &str) -> Result<bool> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector('{}');
            if (!el) return false;
            el.focus();
            el.value = '{}';
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#,
        sanitize_js_string(selector),
        sanitize_js_string(value)
    );
    Ok(page.execute_js(&js).await?.as_bool().unwrap_or(false))
}

/// Keyboard-level default action: dispatch Enter on the element and, if it
/// sits inside a form, submit that form. Fallback when no submit control
/// could be located.
pub async fn press_enter(page: &dyn PageSession, selector: &str) -> Result<bool> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector('{}');
            if (!el) return false;
            const ev = new KeyboardEvent('keydown', {{ key: 'Enter', code: 'Enter', bubbles: true }});
            el.dispatchEvent(ev);
            const form = el.closest('form');
            if (form) {{
                if (form.requestSubmit) {{ form.requestSubmit(); }} else {{ form.submit(); }}
            }}
            return true;
        }})()"#,
        sanitize_js_string(selector)
    );
    Ok(page.execute_js(&js).await?.as_bool().unwrap_or(false))
}

/// Sanitize a string for safe injection into a JavaScript string literal.
///
/// Escapes everything that could break out of a JS string context:
/// backslashes, quote characters, backticks, newlines, and angle brackets
/// (to prevent `</script>` injection). Null bytes are stripped.
pub fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::PageSession;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted page: answers `querySelectorAll(...).length` probes from a
    /// fixed table and records every script it sees.
    struct ScriptedPage {
        matching: Vec<&'static str>,
        scripts: Mutex<Vec<String>>,
    }

    impl ScriptedPage {
        fn new(matching: Vec<&'static str>) -> Self {
            Self {
                matching,
                scripts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageSession for ScriptedPage {
        async fn navigate(&mut self, _url: &str, _timeout_ms: u64) -> anyhow::Result<()> {
            Ok(())
        }
        async fn execute_js(&self, script: &str) -> anyhow::Result<serde_json::Value> {
            self.scripts.lock().unwrap().push(script.to_string());
            if script.contains("querySelectorAll") {
                let hit = self.matching.iter().any(|sel| script.contains(sel));
                return Ok(serde_json::json!(if hit { 1 } else { 0 }));
            }
            Ok(serde_json::json!(true))
        }
        async fn visible_text(&self) -> anyhow::Result<String> {
            Ok(String::new())
        }
        async fn html(&self) -> anyhow::Result<String> {
            Ok(String::new())
        }
        async fn url(&self) -> anyhow::Result<String> {
            Ok("about:blank".to_string())
        }
        async fn screenshot(&self) -> anyhow::Result<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn close(self: Box<Self>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn candidates(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_locate_first_match_wins() {
        let page = ScriptedPage::new(vec!["input.card-number"]);
        let cands = candidates(&[
            "#gift-card-code",
            "input.card-number",
            "form input",
        ]);
        let hit = locate(&page, &cands).await.unwrap().unwrap();
        assert_eq!(hit.selector, "input.card-number");
    }

    #[tokio::test]
    async fn test_locate_none_is_not_an_error() {
        let page = ScriptedPage::new(vec![]);
        let cands = candidates(&["#nope", ".missing"]);
        let result = locate(&page, &cands).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_locate_short_circuits() {
        let page = ScriptedPage::new(vec!["#first"]);
        let cands = candidates(&["#first", "#second"]);
        locate(&page, &cands).await.unwrap();
        let scripts = page.scripts.lock().unwrap();
        // One probe only: the runner stops at the first hit.
        assert_eq!(scripts.len(), 1);
    }

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize_js_string("hello"), "hello");
        assert_eq!(sanitize_js_string("it's"), "it\\'s");
        assert_eq!(sanitize_js_string("a\"b"), "a\\\"b");
    }

    #[test]
    fn test_sanitize_script_breakout() {
        let malicious = r#"'); alert(1); ('"#;
        let sanitized = sanitize_js_string(malicious);
        assert!(sanitized.starts_with("\\')"));
    }

    #[test]
    fn test_sanitize_strips_null_and_tags() {
        assert_eq!(sanitize_js_string("a\0b"), "ab");
        assert!(!sanitize_js_string("</script>").contains("</script>"));
    }
}
