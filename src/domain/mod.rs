//! Core domain models for depbatch
//!
//! This module contains the fundamental types used throughout the application:
//! - Upgrade plan entries and the plan filter
//! - Manifest references
//! - Invocation outcomes
//! - Per-pair tallies and the batch report

mod manifest_ref;
mod outcome;
mod plan;
mod report;

pub use manifest_ref::ManifestRef;
pub use outcome::{FailureKind, InvocationOutcome};
pub use plan::{PlanFilter, UpgradePlan, UpgradeSpec};
pub use report::{BatchReport, FailedInvocation, PairResult, PairTally};
