//! Text output formatter for human-readable display
//!
//! This module provides:
//! - One line per upgrade with upgraded/error/skipped counts
//! - Failure details under the upgrade they belong to
//! - Grand totals at the end of the run
//! - Per-file results of config normalization

use crate::domain::{BatchReport, FailedInvocation, PairResult, PairTally};
use crate::normalizer::{FileOutcome, FileStatus, NormalizeSummary};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    /// `Upgraded: a, Errors: f, Skipped: s`
    fn tally_text(&self, tally: &PairTally) -> String {
        let errors = format!("Errors: {}", tally.failed);
        let errors = if self.color && tally.failed > 0 {
            errors.red().to_string()
        } else {
            errors
        };
        format!(
            "Upgraded: {}, {}, Skipped: {}",
            tally.applied, errors, tally.not_applicable
        )
    }

    /// Bracketed status label such as `[ERROR]`
    fn label(&self, text: &str) -> String {
        let label = format!("[{}]", text);
        if !self.color {
            return label;
        }
        match text {
            "ERROR" | "TIMEOUT" => label.red().bold().to_string(),
            "FIXED" | "WOULD FIX" => label.green().to_string(),
            _ => label.dimmed().to_string(),
        }
    }

    fn format_failure(
        &self,
        failure: &FailedInvocation,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let label = failure.kind.to_string().to_uppercase();
        writeln!(
            writer,
            "  {} {}: {}",
            self.label(&label),
            failure.manifest,
            failure.message
        )
    }

    fn format_file(
        &self,
        file: &FileOutcome,
        dry_run: bool,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let path = file.path.display();
        match &file.status {
            FileStatus::Rewritten { action } => {
                let label = if dry_run { "WOULD FIX" } else { "FIXED" };
                writeln!(writer, "{} {} ({})", self.label(label), path, action)
            }
            FileStatus::Unchanged => {
                if self.verbosity == Verbosity::Verbose {
                    writeln!(writer, "{} {}", self.label("OK"), path)
                } else {
                    Ok(())
                }
            }
            FileStatus::Failed { message } => {
                writeln!(writer, "{} {}: {}", self.label("ERROR"), path, message)
            }
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_start(
        &self,
        manifests_found: usize,
        upgrades: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.is_quiet() {
            return Ok(());
        }
        writeln!(writer, "Found {} project files", manifests_found)?;
        if self.verbosity == Verbosity::Verbose {
            writeln!(writer, "Applying {} upgrades", upgrades)?;
        }
        writeln!(writer)
    }

    fn format_pair(&self, pair: &PairResult, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.is_quiet() {
            return Ok(());
        }
        let title = if self.color {
            pair.spec.to_string().bold().to_string()
        } else {
            pair.spec.to_string()
        };
        writeln!(writer, "{}: {}", title, self.tally_text(&pair.tally))?;
        for failure in &pair.failures {
            self.format_failure(failure, writer)?;
        }
        Ok(())
    }

    fn format_report(&self, report: &BatchReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let totals = PairTally {
            applied: report.total_applied(),
            failed: report.total_failed(),
            not_applicable: report.total_not_applicable(),
        };

        if self.is_quiet() {
            return writeln!(writer, "{}", self.tally_text(&totals));
        }

        writeln!(writer)?;
        let header = "Summary";
        if self.color {
            writeln!(writer, "{}", header.bold())?;
        } else {
            writeln!(writer, "{}", header)?;
        }
        writeln!(
            writer,
            "  Project files: {}, Upgrades: {}, Invocations: {}",
            report.manifests_found,
            report.pairs.len(),
            report.total_invocations()
        )?;
        writeln!(writer, "  {}", self.tally_text(&totals))?;

        let timeouts: usize = report.pairs.iter().map(PairResult::timeout_count).sum();
        if timeouts > 0 {
            writeln!(writer, "  Timed out: {}", timeouts)?;
        }

        if self.verbosity == Verbosity::Verbose && report.has_failures() {
            writeln!(writer)?;
            writeln!(writer, "Failures:")?;
            for (spec, failure) in report.all_failures() {
                writeln!(
                    writer,
                    "  {} {} ({}): {}",
                    failure.manifest,
                    spec,
                    failure.kind,
                    failure.message
                )?;
            }
        }
        Ok(())
    }

    fn format_normalize(
        &self,
        summary: &NormalizeSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let prefix = match (summary.dry_run, self.color) {
            (true, true) => format!("{} ", "(dry-run)".cyan()),
            (true, false) => "(dry-run) ".to_string(),
            _ => String::new(),
        };

        if !self.is_quiet() {
            writeln!(writer, "Found {} config files", summary.files.len())?;
            for file in &summary.files {
                self.format_file(file, summary.dry_run, writer)?;
            }
            writeln!(writer)?;
        }

        writeln!(
            writer,
            "{}Fixed: {}, Unchanged: {}, Errors: {}",
            prefix,
            summary.rewritten(),
            summary.unchanged(),
            summary.failed()
        )
    }
}
