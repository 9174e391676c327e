//! Batch report types
//!
//! Provides structures for tracking upgrade outcomes per plan entry and for
//! the whole run.

use super::{FailureKind, InvocationOutcome, ManifestRef, UpgradeSpec};
use serde::{Deserialize, Serialize};

/// Outcome counters for one upgrade across all manifests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairTally {
    /// Manifests now on the target version
    pub applied: usize,
    /// Invocations that errored or timed out
    pub failed: usize,
    /// Manifests that do not reference the package
    pub not_applicable: usize,
}

impl PairTally {
    /// Creates an empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one outcome
    pub fn record(&mut self, outcome: &InvocationOutcome) {
        match outcome {
            InvocationOutcome::Applied => self.applied += 1,
            InvocationOutcome::NotApplicable => self.not_applicable += 1,
            InvocationOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Number of outcomes recorded
    pub fn total(&self) -> usize {
        self.applied + self.failed + self.not_applicable
    }
}

/// A failed invocation kept for the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedInvocation {
    /// Manifest the upgrade was applied to
    pub manifest: ManifestRef,
    /// Failure category
    pub kind: FailureKind,
    /// Truncated diagnostic
    pub message: String,
}

/// Result of one plan entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairResult {
    /// The upgrade that was applied
    pub spec: UpgradeSpec,
    /// Outcome counters
    pub tally: PairTally,
    /// Details of every failed invocation, in manifest order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedInvocation>,
}

impl PairResult {
    /// Creates a new PairResult with an empty tally
    pub fn new(spec: UpgradeSpec) -> Self {
        Self {
            spec,
            tally: PairTally::new(),
            failures: Vec::new(),
        }
    }

    /// Folds one outcome into the result
    pub fn record(&mut self, manifest: &ManifestRef, outcome: &InvocationOutcome) {
        self.tally.record(outcome);
        if let InvocationOutcome::Failed { kind, message } = outcome {
            self.failures.push(FailedInvocation {
                manifest: manifest.clone(),
                kind: *kind,
                message: message.clone(),
            });
        }
    }

    /// Number of failures that were timeouts
    pub fn timeout_count(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.kind == FailureKind::Timeout)
            .count()
    }
}

/// Overall report of a batch upgrade run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of manifests each upgrade was applied to
    pub manifests_found: usize,
    /// Per-upgrade results, in plan order
    pub pairs: Vec<PairResult>,
}

impl BatchReport {
    /// Creates an empty report
    pub fn new(manifests_found: usize) -> Self {
        Self {
            manifests_found,
            pairs: Vec::new(),
        }
    }

    /// Appends a completed pair
    pub fn add_pair(&mut self, pair: PairResult) {
        self.pairs.push(pair);
    }

    /// Total successful upgrades
    pub fn total_applied(&self) -> usize {
        self.pairs.iter().map(|p| p.tally.applied).sum()
    }

    /// Total failed invocations
    pub fn total_failed(&self) -> usize {
        self.pairs.iter().map(|p| p.tally.failed).sum()
    }

    /// Total skipped invocations
    pub fn total_not_applicable(&self) -> usize {
        self.pairs.iter().map(|p| p.tally.not_applicable).sum()
    }

    /// Total outcomes recorded
    pub fn total_invocations(&self) -> usize {
        self.pairs.iter().map(|p| p.tally.total()).sum()
    }

    /// Returns true if any invocation failed
    pub fn has_failures(&self) -> bool {
        self.total_failed() > 0
    }

    /// All failures across pairs
    pub fn all_failures(&self) -> impl Iterator<Item = (&UpgradeSpec, &FailedInvocation)> {
        self.pairs
            .iter()
            .flat_map(|p| p.failures.iter().map(move |f| (&p.spec, f)))
    }
}
