//! Pattern-based result classification for captured pages.
//!
//! Takes the rendered text and raw markup of a result page and maps them to
//! exactly one `StatusCategory`, plus amount/currency for balance lookups.
//! Classification is pure: it depends only on the given inputs, never on the
//! network or timing, so it is unit-testable with canned captures.
//!
//! Phrase and amount patterns are data, not logic: they are loaded at compile
//! time from `patterns.json` via `include_str!` so there is no runtime file
//! I/O. Pattern order in the file is significant — `already_redeemed` phrases
//! are listed before the generic `invalid` phrases because the invalid set
//! over-matches by substring.

use crate::config::Region;
use crate::record::StatusCategory;
use regex::Regex;
use scraper::Html;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Raw JSON content of the pattern configuration, embedded at compile time.
const PATTERNS_JSON: &str = include_str!("patterns.json");

/// Message used when no pattern matched anything.
const UNPARSED_MESSAGE: &str = "Could not parse a result from the page";

/// Which operation produced the capture. Redemption uses a different phrase
/// list (it has explicit success phrases) and skips the amount passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Lookup,
    Redemption,
}

/// Outcome of classifying one page capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: StatusCategory,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub message: String,
}

// ── Embedded configuration ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PatternConfig {
    regions: HashMap<String, RegionConfig>,
    selectors: HashMap<String, Vec<String>>,
    lookup_errors: Vec<PhraseRule>,
    redeem_status: Vec<PhraseRule>,
    /// Ordered: the list position is the fallback priority across regions.
    amount_patterns: Vec<AmountRule>,
}

/// Amount regexes for one region, in match-priority order.
#[derive(Debug, Deserialize)]
struct AmountRule {
    region: String,
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegionConfig {
    pub lookup_url: String,
    pub redeem_url: String,
    pub login_url: String,
    pub currency: String,
}

/// One ordered phrase rule: first rule whose phrase appears in the text wins.
#[derive(Debug, Deserialize)]
struct PhraseRule {
    status: StatusCategory,
    message: String,
    phrases: Vec<String>,
}

static CONFIG: LazyLock<PatternConfig> = LazyLock::new(|| {
    serde_json::from_str(PATTERNS_JSON).expect("patterns.json is embedded and must parse")
});

/// Compiled amount regexes per region, preserving the file's region order —
/// that order is the cross-region fallback priority.
static AMOUNT_REGEXES: LazyLock<Vec<(String, Vec<Regex>)>> = LazyLock::new(|| {
    CONFIG
        .amount_patterns
        .iter()
        .map(|rule| {
            let compiled = rule
                .patterns
                .iter()
                .map(|p| Regex::new(p).expect("embedded amount pattern must compile"))
                .collect();
            (rule.region.clone(), compiled)
        })
        .collect()
});

/// Region-specific target URLs and currency symbol.
pub fn region_config(region: Region) -> &'static RegionConfig {
    CONFIG
        .regions
        .get(region.as_str())
        .expect("embedded config covers every Region variant")
}

/// Candidate selector list by name (`code_input`, `submit_control`, ...).
pub fn selector_candidates(name: &str) -> &'static [String] {
    CONFIG
        .selectors
        .get(name)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

// ── Classification ───────────────────────────────────────────────────────────

/// Classify a captured page into exactly one status category.
///
/// Passes run in fixed priority order:
/// 1. Phrase pass over the rendered text (error list for lookups, status
///    list for redemptions). First matching rule wins.
/// 2. Amount pass (lookup only): region-ordered currency regexes over the
///    text; first numeric capture sets amount + currency, status `Valid`.
/// 3. Last resort (lookup only): the same regexes over the text content of
///    the raw markup, catching amounts hidden from the rendered text.
///
/// If nothing matches, the result is `Unknown` with a fixed message.
pub fn classify(text: &str, html: &str, region: Region, operation: Operation) -> Classification {
    let rules = match operation {
        Operation::Lookup => &CONFIG.lookup_errors,
        Operation::Redemption => &CONFIG.redeem_status,
    };

    if let Some(rule) = match_phrases(text, rules) {
        return Classification {
            status: rule.status,
            amount: None,
            currency: None,
            message: rule.message.clone(),
        };
    }

    if operation == Operation::Lookup {
        if let Some((amount, currency)) = match_amount(text, region) {
            return Classification {
                status: StatusCategory::Valid,
                amount: Some(amount),
                currency: Some(currency),
                message: "Balance found".to_string(),
            };
        }

        // Last resort: scan the markup's text content. Flattening through
        // the parser also reaches text the rendered capture missed
        // (collapsed panels, aria-hidden balance labels).
        let markup_text = flatten_markup(html);
        if let Some((amount, currency)) = match_amount(&markup_text, region) {
            return Classification {
                status: StatusCategory::Valid,
                amount: Some(amount),
                currency: Some(currency),
                message: "Balance found in page markup".to_string(),
            };
        }
    }

    Classification {
        status: StatusCategory::Unknown,
        amount: None,
        currency: None,
        message: UNPARSED_MESSAGE.to_string(),
    }
}

/// Return the first rule with a phrase contained in `text`.
///
/// Matching is case-insensitive and substring-based; rule order in the
/// embedded file is the priority order.
fn match_phrases<'a>(text: &str, rules: &'a [PhraseRule]) -> Option<&'a PhraseRule> {
    let haystack = text.to_lowercase();
    rules.iter().find(|rule| {
        rule.phrases
            .iter()
            .any(|phrase| haystack.contains(&phrase.to_lowercase()))
    })
}

/// Try the active region's amount regexes first, then the remaining regions
/// in the order the embedded file lists them. Returns `(amount,
/// currency_symbol)` of the first capture.
fn match_amount(text: &str, region: Region) -> Option<(String, String)> {
    let primary = region.as_str();

    if let Some(hit) = match_amount_for(text, primary) {
        return Some(hit);
    }
    for (label, _) in AMOUNT_REGEXES.iter() {
        if label != primary {
            if let Some(hit) = match_amount_for(text, label) {
                return Some(hit);
            }
        }
    }
    None
}

fn match_amount_for(text: &str, region_label: &str) -> Option<(String, String)> {
    let (_, regexes) = AMOUNT_REGEXES
        .iter()
        .find(|(label, _)| label == region_label)?;
    let currency = CONFIG.regions.get(region_label)?.currency.clone();
    for re in regexes {
        if let Some(caps) = re.captures(text) {
            if let Some(amount) = caps.get(1) {
                return Some((amount.as_str().to_string(), currency));
            }
        }
    }
    None
}

/// Collapse an HTML document to its whitespace-joined text content.
fn flatten_markup(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}
