//! Integration tests for depbatch
//!
//! These tests verify:
//! - Manifest discovery feeding the orchestrator over a real directory tree
//! - Outcome tallies for a scripted package manager
//! - nuget.config normalization across a tree

use async_trait::async_trait;
use depbatch::domain::{FailureKind, PlanFilter, UpgradePlan, UpgradeSpec};
use depbatch::invoker::UpgradeInvoker;
use depbatch::locator::{self, NamePattern, CONFIG_PATTERN, MANIFEST_PATTERN};
use depbatch::normalizer::{self, FileStatus, XML_DECLARATION};
use depbatch::orchestrator::{Orchestrator, OrchestratorConfig};
use depbatch::runner::{CommandOutput, CommandRunner, RunError};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Test fixture directory creation helper
fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Fake package manager: answers by project file name and package id
///
/// - `Legacy.csproj` never references anything
/// - `Broken.csproj` fails with a restore error
/// - package `Slow.Package` times out everywhere
struct FakeDotnet {
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeDotnet {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeDotnet {
    async fn run(
        &self,
        _program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, RunError> {
        self.calls.lock().unwrap().push(args.to_vec());
        let manifest = &args[1];
        let package = &args[3];

        if package == "Slow.Package" {
            return Err(RunError::Timeout(timeout));
        }
        if manifest.ends_with("Legacy.csproj") {
            return Ok(CommandOutput::failure(
                1,
                format!(
                    "error: Project '{}' does not have a package reference to '{}'.",
                    manifest, package
                ),
            ));
        }
        if manifest.ends_with("Broken.csproj") {
            return Ok(CommandOutput::failure(
                1,
                "error NU1101: Unable to find package",
            ));
        }
        Ok(CommandOutput::success("info : PackageReference added"))
    }
}

fn create_solution(root: &Path) {
    write_file(root, "src/Api/Api.csproj", "<Project Sdk=\"Microsoft.NET.Sdk.Web\" />");
    write_file(root, "src/Worker/Worker.csproj", "<Project Sdk=\"Microsoft.NET.Sdk\" />");
    write_file(root, "legacy/Legacy.csproj", "<Project />");
    write_file(root, "tools/Broken.csproj", "<Project />");
    write_file(root, "src/Api/Program.cs", "");
    write_file(root, "README.md", "# solution");
}

mod upgrade_run {
    use super::*;

    #[tokio::test]
    async fn test_tallies_over_located_manifests() {
        let temp_dir = create_test_dir();
        create_solution(temp_dir.path());

        let manifests = locator::find_manifests(temp_dir.path(), MANIFEST_PATTERN).unwrap();
        assert_eq!(manifests.len(), 4);

        let plan = UpgradePlan::new(vec![
            UpgradeSpec::new("Dapr.Client", "1.14.0"),
            UpgradeSpec::new("Slow.Package", "2.0.0"),
        ]);
        let orchestrator = Orchestrator::new(UpgradeInvoker::new(FakeDotnet::new()));
        let report = orchestrator.run(&plan, &manifests).await;

        assert_eq!(report.manifests_found, 4);
        assert_eq!(report.pairs.len(), 2);

        let dapr = &report.pairs[0];
        assert_eq!(dapr.tally.applied, 2);
        assert_eq!(dapr.tally.not_applicable, 1);
        assert_eq!(dapr.tally.failed, 1);
        assert_eq!(dapr.failures[0].kind, FailureKind::ExternalError);
        assert!(dapr.failures[0].manifest.path().ends_with("tools/Broken.csproj"));

        let slow = &report.pairs[1];
        assert_eq!(slow.tally.failed, 4);
        assert_eq!(slow.timeout_count(), 4);

        for pair in &report.pairs {
            assert_eq!(pair.tally.total(), manifests.len());
        }
        assert_eq!(report.total_invocations(), 8);
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let temp_dir = create_test_dir();
        create_solution(temp_dir.path());
        let manifests = locator::find_manifests(temp_dir.path(), MANIFEST_PATTERN).unwrap();
        let plan = UpgradePlan::default_plan();

        let sequential = Orchestrator::new(UpgradeInvoker::new(FakeDotnet::new()))
            .run(&plan, &manifests)
            .await;
        let parallel = Orchestrator::with_config(
            UpgradeInvoker::new(FakeDotnet::new()),
            OrchestratorConfig::default().with_jobs(4),
        )
        .run(&plan, &manifests)
        .await;

        assert_eq!(sequential, parallel);
        assert_eq!(parallel.pairs.len(), 29);
    }

    #[tokio::test]
    async fn test_filtered_plan_from_toml() {
        let temp_dir = create_test_dir();
        create_solution(temp_dir.path());
        write_file(
            temp_dir.path(),
            "upgrades.toml",
            r#"
[[upgrade]]
package = "xunit"
version = "2.9.2"

[[upgrade]]
package = "Moq"
version = "4.20.72"
"#,
        );

        let plan = UpgradePlan::from_file(&temp_dir.path().join("upgrades.toml"))
            .unwrap()
            .filtered(&PlanFilter::new().with_exclude(vec!["moq".to_string()]));
        assert_eq!(plan.len(), 1);

        let manifests = locator::find_manifests(temp_dir.path(), MANIFEST_PATTERN).unwrap();
        let runner = FakeDotnet::new();
        let orchestrator = Orchestrator::new(UpgradeInvoker::new(runner));
        let report = orchestrator.run(&plan, &manifests).await;

        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.pairs[0].spec.package, "xunit");
        assert_eq!(report.total_invocations(), 4);
    }

    #[tokio::test]
    async fn test_empty_tree_makes_no_invocations() {
        let temp_dir = create_test_dir();
        let manifests = locator::find_manifests(temp_dir.path(), MANIFEST_PATTERN).unwrap();
        assert!(manifests.is_empty());

        let report = Orchestrator::new(UpgradeInvoker::new(FakeDotnet::new()))
            .run(&UpgradePlan::default_plan(), &manifests)
            .await;

        assert_eq!(report.pairs.len(), 29);
        assert_eq!(report.total_invocations(), 0);
        assert!(!report.has_failures());
    }
}

mod config_normalization {
    use super::*;

    const BODY: &str = "<configuration>\n  <packageSources>\n    <clear />\n  </packageSources>\n</configuration>\n";

    #[test]
    fn test_normalizes_every_config_in_tree() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        write_file(root, "NuGet.Config", &format!("Licensed under MIT\n{}", BODY));
        write_file(
            root,
            "src/nuget.config",
            &format!("/*\n * Copyright\n */\n{}", BODY),
        );
        write_file(
            root,
            "tests/nuget.config",
            &format!("{}\n{}", XML_DECLARATION, BODY),
        );
        write_file(root, "broken/nuget.config", "not xml at all");

        let pattern = NamePattern::new(CONFIG_PATTERN).unwrap();
        let files = locator::find_files(root, &pattern).unwrap();
        assert_eq!(files.len(), 4);

        let summary = normalizer::normalize_files(&files, false);
        assert_eq!(summary.rewritten(), 2);
        assert_eq!(summary.unchanged(), 1);
        assert_eq!(summary.failed(), 1);

        let top = fs::read_to_string(root.join("NuGet.Config")).unwrap();
        assert_eq!(top, format!("{}\n{}", XML_DECLARATION, BODY));

        let src = fs::read_to_string(root.join("src/nuget.config")).unwrap();
        let lines: Vec<&str> = src.lines().collect();
        assert_eq!(lines[0], XML_DECLARATION);
        assert_eq!(lines[1], "<!--");

        assert_eq!(
            fs::read_to_string(root.join("broken/nuget.config")).unwrap(),
            "not xml at all"
        );

        // A second pass has nothing left to do.
        let again = normalizer::normalize_files(&files, false);
        assert_eq!(again.rewritten(), 0);
        assert_eq!(again.unchanged(), 3);
        assert!(again
            .files
            .iter()
            .all(|f| !matches!(f.status, FileStatus::Rewritten { .. })));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = create_test_dir();
        let raw = format!("Licensed under MIT\n{}", BODY);
        write_file(temp_dir.path(), "nuget.config", &raw);

        let pattern = NamePattern::new(CONFIG_PATTERN).unwrap();
        let files = locator::find_files(temp_dir.path(), &pattern).unwrap();
        let summary = normalizer::normalize_files(&files, true);

        assert!(summary.dry_run);
        assert_eq!(summary.rewritten(), 1);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("nuget.config")).unwrap(),
            raw
        );
    }
}
