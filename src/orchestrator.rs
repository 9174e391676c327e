//! Batch upgrade orchestrator
//!
//! This module provides:
//! - Workflow coordination: plan × manifests → invoke → tally → report
//! - Optional bounded parallelism across the manifests of one upgrade
//! - Per-upgrade progress callbacks so callers can print as the run goes
//!
//! A failed invocation never stops the batch: every combination is attempted
//! exactly once and ends up in the report.

use crate::domain::{
    BatchReport, InvocationOutcome, ManifestRef, PairResult, UpgradePlan, UpgradeSpec,
};
use crate::invoker::UpgradeInvoker;
use crate::progress::Progress;
use crate::runner::CommandRunner;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Default number of concurrent package manager processes
const DEFAULT_JOBS: usize = 1;

/// Upper bound for concurrent package manager processes
pub const MAX_JOBS: usize = 16;

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum concurrent invocations within one upgrade
    pub jobs: usize,
    /// Whether to draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            show_progress: false,
        }
    }
}

impl OrchestratorConfig {
    /// Set the concurrency limit, clamped to `1..=MAX_JOBS`
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.clamp(1, MAX_JOBS);
        self
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

/// Orchestrator for coordinating the batch upgrade
pub struct Orchestrator<R> {
    /// Invoker shared with spawned tasks
    invoker: Arc<UpgradeInvoker<R>>,
    /// Run configuration
    config: OrchestratorConfig,
}

impl<R: CommandRunner + 'static> Orchestrator<R> {
    /// Create a sequential orchestrator without progress display
    pub fn new(invoker: UpgradeInvoker<R>) -> Self {
        Self::with_config(invoker, OrchestratorConfig::default())
    }

    /// Create an orchestrator with the given configuration
    pub fn with_config(invoker: UpgradeInvoker<R>, config: OrchestratorConfig) -> Self {
        let config = OrchestratorConfig {
            jobs: config.jobs.clamp(1, MAX_JOBS),
            ..config
        };
        Self {
            invoker: Arc::new(invoker),
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Apply every upgrade in `plan` to every manifest
    pub async fn run(&self, plan: &UpgradePlan, manifests: &[ManifestRef]) -> BatchReport {
        self.run_with_observer(plan, manifests, |_| {}).await
    }

    /// Apply every upgrade, calling `on_pair` as soon as each upgrade finishes
    ///
    /// `on_pair` runs after all manifests for that upgrade are done and before
    /// the next upgrade starts.
    pub async fn run_with_observer<F>(
        &self,
        plan: &UpgradePlan,
        manifests: &[ManifestRef],
        mut on_pair: F,
    ) -> BatchReport
    where
        F: FnMut(&PairResult),
    {
        let mut progress = Progress::new(self.config.show_progress);
        let mut report = BatchReport::new(manifests.len());

        progress.start_batch(plan.len(), manifests.len());

        for spec in plan.iter() {
            progress.begin_pair(spec);

            let outcomes = if self.config.jobs > 1 && manifests.len() > 1 {
                self.apply_parallel(spec, manifests, &progress).await
            } else {
                self.apply_sequential(spec, manifests, &progress).await
            };

            let mut pair = PairResult::new(spec.clone());
            for (manifest, outcome) in manifests.iter().zip(&outcomes) {
                pair.record(manifest, outcome);
            }

            info!(
                package = %spec.package,
                version = %spec.version,
                applied = pair.tally.applied,
                failed = pair.tally.failed,
                skipped = pair.tally.not_applicable,
                "upgrade finished"
            );
            progress.report_pair(|| on_pair(&pair));
            report.add_pair(pair);
        }

        progress.clear();
        info!(
            manifests = report.manifests_found,
            applied = report.total_applied(),
            failed = report.total_failed(),
            "batch upgrade complete"
        );

        report
    }

    /// One manifest at a time, in order
    async fn apply_sequential(
        &self,
        spec: &UpgradeSpec,
        manifests: &[ManifestRef],
        progress: &Progress,
    ) -> Vec<InvocationOutcome> {
        let mut outcomes = Vec::with_capacity(manifests.len());
        for manifest in manifests {
            let outcome = self
                .invoker
                .apply(manifest, &spec.package, &spec.version)
                .await;
            outcomes.push(outcome);
            progress.invocation_done();
        }
        outcomes
    }

    /// Up to `jobs` manifests at once; outcomes are returned in manifest order
    async fn apply_parallel(
        &self,
        spec: &UpgradeSpec,
        manifests: &[ManifestRef],
        progress: &Progress,
    ) -> Vec<InvocationOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.jobs));
        let mut join_set = JoinSet::new();

        for (index, manifest) in manifests.iter().enumerate() {
            let invoker = Arc::clone(&self.invoker);
            let semaphore = Arc::clone(&semaphore);
            let manifest = manifest.clone();
            let spec = spec.clone();

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let outcome = invoker
                    .apply(&manifest, &spec.package, &spec.version)
                    .await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<InvocationOutcome>> = vec![None; manifests.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => error!(error = %e, "upgrade task panicked"),
            }
            progress.invocation_done();
        }

        // A panicked task still has to count, or the tally would not add up.
        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    InvocationOutcome::external_error("upgrade task did not complete")
                })
            })
            .collect()
    }
}
