//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of the batch report, written once the run is over
//! - Per-file normalization results

use crate::domain::{BatchReport, PairResult};
use crate::normalizer::{FileOutcome, NormalizeSummary};
use crate::output::{OutputFormatter, Verbosity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Quiet mode drops per-item details
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn write_json<T: Serialize>(&self, value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}

/// JSON representation of an upgrade run
#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    manifests_found: usize,
    summary: JsonTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pairs: Option<&'a [PairResult]>,
}

/// Grand totals across all pairs
#[derive(Serialize)]
struct JsonTotals {
    upgrades: usize,
    invocations: usize,
    applied: usize,
    failed: usize,
    not_applicable: usize,
}

/// JSON representation of a normalization run
#[derive(Serialize)]
struct JsonNormalize<'a> {
    generated_at: DateTime<Utc>,
    dry_run: bool,
    summary: JsonNormalizeTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<&'a [FileOutcome]>,
}

#[derive(Serialize)]
struct JsonNormalizeTotals {
    files: usize,
    rewritten: usize,
    unchanged: usize,
    failed: usize,
}

impl OutputFormatter for JsonFormatter {
    fn format_start(&self, _: usize, _: usize, _: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn format_pair(&self, _: &PairResult, _: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn format_report(&self, report: &BatchReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonReport {
            generated_at: Utc::now(),
            manifests_found: report.manifests_found,
            summary: JsonTotals {
                upgrades: report.pairs.len(),
                invocations: report.total_invocations(),
                applied: report.total_applied(),
                failed: report.total_failed(),
                not_applicable: report.total_not_applicable(),
            },
            pairs: (self.verbosity != Verbosity::Quiet).then_some(report.pairs.as_slice()),
        };
        self.write_json(&output, writer)
    }

    fn format_normalize(
        &self,
        summary: &NormalizeSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonNormalize {
            generated_at: Utc::now(),
            dry_run: summary.dry_run,
            summary: JsonNormalizeTotals {
                files: summary.files.len(),
                rewritten: summary.rewritten(),
                unchanged: summary.unchanged(),
                failed: summary.failed(),
            },
            files: (self.verbosity != Verbosity::Quiet).then_some(summary.files.as_slice()),
        };
        self.write_json(&output, writer)
    }
}
