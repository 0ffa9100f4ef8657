//! Result persistence: JSON report plus a companion delimited-text file.
//!
//! The JSON document carries a metadata block (per-status counts, region,
//! run id, generation time) ahead of the ordered result list. The text file
//! has one row per record with every field quoted, so downstream
//! spreadsheet imports never mis-split on embedded commas.

use crate::config::Region;
use crate::record::{OutcomeRecord, StatusCategory};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Metadata block of the JSON report.
#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    pub run_id: String,
    pub region: Region,
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    /// Count per status category, keyed by the stable status label.
    pub counts: BTreeMap<&'static str, usize>,
}

/// The full JSON report document.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub metadata: ReportMetadata,
    pub results: &'a [OutcomeRecord],
}

impl<'a> Report<'a> {
    pub fn new(region: Region, results: &'a [OutcomeRecord]) -> Self {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for record in results {
            *counts.entry(record.status.as_str()).or_insert(0) += 1;
        }
        Self {
            metadata: ReportMetadata {
                run_id: uuid::Uuid::new_v4().to_string(),
                region,
                generated_at: Utc::now(),
                total: results.len(),
                counts,
            },
            results,
        }
    }

    /// Count for one status category (0 when absent).
    pub fn count(&self, status: StatusCategory) -> usize {
        self.metadata.counts.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// Write the JSON report document.
pub fn write_json_report(path: &Path, report: &Report<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "wrote JSON report");
    Ok(())
}

/// Write the companion delimited-text file, quoting every field.
pub fn write_delimited(path: &Path, records: &[OutcomeRecord]) -> Result<()> {
    let mut out = String::new();
    out.push_str("\"code\",\"status\",\"amount\",\"currency\",\"message\",\"timestamp\"\n");
    for record in records {
        let row = [
            record.code.as_str(),
            record.status.as_str(),
            record.amount.as_deref().unwrap_or(""),
            record.currency.as_deref().unwrap_or(""),
            record.message.as_str(),
            &record.timestamp.to_rfc3339(),
        ]
        .iter()
        .map(|field| quote(field))
        .collect::<Vec<_>>()
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    std::fs::write(path, out)
        .with_context(|| format!("failed to write results '{}'", path.display()))?;
    tracing::info!(path = %path.display(), count = records.len(), "wrote delimited results");
    Ok(())
}

/// Quote a field, doubling embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
