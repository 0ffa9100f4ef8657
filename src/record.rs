//! Outcome records and code masking.
//!
//! One `OutcomeRecord` is produced per code per operation. Records are
//! append-only: once built they are never mutated, and the batch driver
//! returns them in input order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed placeholder used when a code is too short to mask meaningfully.
const MASK_PLACEHOLDER: &str = "********";

/// Terminal classification of a single code operation.
///
/// Categories form a closed set; classification order matters and is owned
/// by the classifier (`already_redeemed` phrases are tested before the
/// generic `invalid` phrases).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    /// Code is valid; amount/currency carry the balance when known.
    Valid,
    /// Code was rejected as unknown or malformed by the site.
    Invalid,
    /// Code exists but has already been redeemed.
    AlreadyRedeemed,
    /// Code exists but is past its expiry date.
    Expired,
    /// Code belongs to a different storefront region.
    RegionMismatch,
    /// Page rendered but no pattern matched. Expected terminal state,
    /// not a fault.
    Unknown,
    /// All retry attempts failed (navigation, element lookup, timeout).
    TransientError,
}

impl StatusCategory {
    /// Stable lowercase label, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::AlreadyRedeemed => "already_redeemed",
            Self::Expired => "expired",
            Self::RegionMismatch => "region_mismatch",
            Self::Unknown => "unknown",
            Self::TransientError => "transient_error",
        }
    }
}

impl std::fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one code lookup or redemption. Immutable once produced.
///
/// `code` is always the masked form; the raw code never appears in records,
/// logs, or output files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Masked code (first 4 + last 4 characters visible).
    pub code: String,
    /// Terminal status category.
    pub status: StatusCategory,
    /// Balance amount as a decimal string, when the classifier found one.
    pub amount: Option<String>,
    /// Currency symbol accompanying `amount`.
    pub currency: Option<String>,
    /// Human-readable message (canned per pattern, or the last error).
    pub message: String,
    /// When the record was produced.
    pub timestamp: DateTime<Utc>,
}

impl OutcomeRecord {
    /// Build a record for `code`, masking it and stamping the current time.
    pub fn new(
        code: &str,
        status: StatusCategory,
        amount: Option<String>,
        currency: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: mask(code),
            status,
            amount,
            currency,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Build a terminal `TransientError` record from the last attempt's error.
    pub fn transient(code: &str, message: impl Into<String>) -> Self {
        Self::new(code, StatusCategory::TransientError, None, None, message)
    }
}

/// Mask a code for display and persistence.
///
/// Reveals only the first 4 and last 4 characters; everything between is
/// replaced with `****`. Codes shorter than 8 characters return a fixed
/// placeholder so nothing of them leaks. Idempotent: masked output (the
/// placeholder included) masks to itself.
pub fn mask(code: &str) -> String {
    if code == MASK_PLACEHOLDER {
        return MASK_PLACEHOLDER.to_string();
    }
    let chars: Vec<char> = code.chars().collect();
    if chars.len() < 8 {
        return MASK_PLACEHOLDER.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}****{tail}")
}
