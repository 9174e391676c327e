//! Single upgrade invocation
//!
//! Runs `dotnet add <manifest> package <id> --version <v>` for one
//! manifest/package pair and turns the process result into an
//! [`InvocationOutcome`].

use crate::domain::{InvocationOutcome, ManifestRef};
use crate::runner::{CommandOutput, CommandRunner, RunError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Package manager executable used when none is configured
pub const DEFAULT_PROGRAM: &str = "dotnet";

/// Wall-clock limit for one invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum number of characters of diagnostic text kept per failure
pub const DIAGNOSTIC_LIMIT: usize = 200;

/// stderr fragments meaning the manifest does not reference the package
pub const NOT_REFERENCED_PATTERNS: [&str; 2] =
    ["does not have a package", "No package references"];

/// Applies upgrades to manifests through a [`CommandRunner`]
pub struct UpgradeInvoker<R> {
    runner: R,
    program: String,
    timeout: Duration,
}

impl<R: CommandRunner> UpgradeInvoker<R> {
    /// Create an invoker using the default program and timeout
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            program: DEFAULT_PROGRAM.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different package manager executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Use a different timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Apply one upgrade to one manifest
    pub async fn apply(
        &self,
        manifest: &ManifestRef,
        package: &str,
        version: &str,
    ) -> InvocationOutcome {
        let args = build_args(manifest, package, version);
        debug!(program = %self.program, ?args, "invoking package manager");

        let result = self.runner.run(&self.program, &args, self.timeout).await;
        let outcome = classify(&result);

        let name = manifest.file_name();
        match &outcome {
            InvocationOutcome::Applied => info!("[OK] {}: {} -> {}", name, package, version),
            InvocationOutcome::NotApplicable => {
                debug!("[SKIP] {}: {} not referenced", name, package)
            }
            InvocationOutcome::Failed { kind, message } => warn!(
                "[{}] {}: {}: {}",
                kind.to_string().to_uppercase(),
                name,
                package,
                message
            ),
        }

        outcome
    }
}

/// Argument vector for `dotnet add ... package ... --version ...`
pub fn build_args(manifest: &ManifestRef, package: &str, version: &str) -> Vec<String> {
    vec![
        "add".to_string(),
        manifest.path().display().to_string(),
        "package".to_string(),
        package.to_string(),
        "--version".to_string(),
        version.to_string(),
    ]
}

/// Classify a command result
///
/// - exit success: `Applied`
/// - failure whose stderr matches [`NOT_REFERENCED_PATTERNS`]: `NotApplicable`
/// - any other failure, or a start error: `Failed(ExternalError)`
/// - timeout: `Failed(Timeout)`
pub fn classify(result: &Result<CommandOutput, RunError>) -> InvocationOutcome {
    match result {
        Ok(output) if output.success => InvocationOutcome::Applied,
        Ok(output) => {
            if is_not_referenced(&output.stderr) {
                InvocationOutcome::NotApplicable
            } else {
                InvocationOutcome::external_error(failure_message(output))
            }
        }
        Err(err @ RunError::Timeout(_)) => InvocationOutcome::timeout(err.to_string()),
        Err(err @ RunError::Spawn { .. }) => {
            InvocationOutcome::external_error(truncate(&err.to_string(), DIAGNOSTIC_LIMIT))
        }
    }
}

fn is_not_referenced(stderr: &str) -> bool {
    NOT_REFERENCED_PATTERNS.iter().any(|p| stderr.contains(p))
}

fn failure_message(output: &CommandOutput) -> String {
    let stderr = output.stderr.trim();
    let text = if !stderr.is_empty() {
        stderr.to_string()
    } else if !output.stdout.trim().is_empty() {
        output.stdout.trim().to_string()
    } else {
        match output.exit_code {
            Some(code) => format!("exited with code {}", code),
            None => "terminated by signal".to_string(),
        }
    };
    truncate(&text, DIAGNOSTIC_LIMIT)
}

/// First `limit` characters of `text`
fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
