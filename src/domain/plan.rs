//! Upgrade plan types
//!
//! An upgrade plan is an ordered list of (package, version) pairs. The order
//! only affects reporting; pairs are applied independently.

use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A single dependency/target-version pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpgradeSpec {
    /// Package identifier as it appears in the manifest
    pub package: String,
    /// Version to upgrade to
    pub version: String,
}

impl UpgradeSpec {
    /// Creates a new UpgradeSpec
    pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for UpgradeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.package, self.version)
    }
}

/// Phase 1 (low-risk) upgrades applied when no plan file is given
const PHASE1_UPGRADES: &[(&str, &str)] = &[
    // Microsoft.AspNetCore.*
    ("Microsoft.AspNetCore.Authentication.JwtBearer", "8.0.11"),
    ("Microsoft.AspNetCore.Authentication.OpenIdConnect", "8.0.11"),
    // Microsoft.EntityFrameworkCore.*
    ("Microsoft.EntityFrameworkCore", "8.0.11"),
    ("Microsoft.EntityFrameworkCore.Design", "8.0.11"),
    ("Microsoft.EntityFrameworkCore.Tools", "8.0.11"),
    ("Pomelo.EntityFrameworkCore.MySql", "8.0.2"),
    // Microsoft.Extensions.*
    ("Microsoft.Extensions.Configuration", "8.0.0"),
    ("Microsoft.Extensions.Configuration.Json", "8.0.1"),
    ("Microsoft.Extensions.Hosting", "8.0.1"),
    ("Microsoft.Extensions.Http.Polly", "8.0.11"),
    // Dapr
    ("Dapr.AspNetCore", "1.14.0"),
    ("Dapr.Client", "1.14.0"),
    ("Dapr.Extensions.Configuration", "1.14.0"),
    // Azure
    ("Azure.Identity", "1.11.4"),
    // Swashbuckle
    ("Swashbuckle.AspNetCore", "6.8.1"),
    // Health checks
    ("AspNetCore.HealthChecks.Dapr", "8.0.2"),
    ("AspNetCore.HealthChecks.MySql", "8.0.1"),
    ("AspNetCore.HealthChecks.MongoDb", "8.1.0"),
    ("AspNetCore.HealthChecks.Redis", "8.0.1"),
    ("AspNetCore.HealthChecks.UI", "8.0.2"),
    ("AspNetCore.HealthChecks.UI.Client", "8.0.1"),
    ("AspNetCore.HealthChecks.UI.InMemory.Storage", "8.0.1"),
    // FluentValidation
    ("FluentValidation", "11.10.0"),
    ("FluentValidation.AspNetCore", "11.3.0"),
    ("FluentValidation.DependencyInjectionExtensions", "11.10.0"),
    // Testing
    ("xunit", "2.9.2"),
    ("xunit.runner.visualstudio", "2.8.2"),
    ("coverlet.collector", "6.0.2"),
    ("Microsoft.NET.Test.Sdk", "17.11.1"),
];

/// Ordered sequence of upgrades
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePlan {
    /// Upgrades in application order
    #[serde(rename = "upgrade", default)]
    pub upgrades: Vec<UpgradeSpec>,
}

impl UpgradePlan {
    /// Creates a plan from a list of specs
    pub fn new(upgrades: Vec<UpgradeSpec>) -> Self {
        Self { upgrades }
    }

    /// The built-in phase 1 plan
    pub fn default_plan() -> Self {
        Self::new(
            PHASE1_UPGRADES
                .iter()
                .map(|(package, version)| UpgradeSpec::new(*package, *version))
                .collect(),
        )
    }

    /// Parse a plan from TOML content
    ///
    /// ```toml
    /// [[upgrade]]
    /// package = "Dapr.Client"
    /// version = "1.14.0"
    /// ```
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, PlanError> {
        let plan: UpgradePlan = toml::from_str(content)
            .map_err(|e| PlanError::toml_parse_error(path, e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Load a plan from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, PlanError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PlanError::read_error(path, e))?;
        Self::from_toml(&content, path)
    }

    /// Reject entries with blank package ids or versions
    pub fn validate(&self) -> Result<(), PlanError> {
        for (index, spec) in self.upgrades.iter().enumerate() {
            if spec.package.trim().is_empty() {
                return Err(PlanError::invalid_entry(index, "empty package id"));
            }
            if spec.version.trim().is_empty() {
                return Err(PlanError::invalid_entry(
                    index,
                    format!("empty version for '{}'", spec.package),
                ));
            }
        }
        Ok(())
    }

    /// Returns a copy of the plan with only the entries the filter accepts
    pub fn filtered(&self, filter: &PlanFilter) -> Self {
        Self::new(
            self.upgrades
                .iter()
                .filter(|spec| filter.should_process_package(&spec.package))
                .cloned()
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.upgrades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UpgradeSpec> {
        self.upgrades.iter()
    }
}

/// Package filter applied to a plan before it runs
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    /// Packages to drop from the plan
    pub exclude: Vec<String>,
    /// If non-empty, keep only these packages
    pub only: Vec<String>,
}

impl PlanFilter {
    /// Create a new PlanFilter that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Set packages to exclude
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set packages to include (only list)
    pub fn with_only(mut self, only: Vec<String>) -> Self {
        self.only = only;
        self
    }

    /// Check if a package should be processed based on filters
    ///
    /// NuGet ids are case-insensitive, so comparisons are too.
    pub fn should_process_package(&self, name: &str) -> bool {
        if !self.only.is_empty() {
            return self.only.iter().any(|p| p.eq_ignore_ascii_case(name));
        }
        !self.exclude.iter().any(|p| p.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_spec_display() {
        let spec = UpgradeSpec::new("Dapr.Client", "1.14.0");
        assert_eq!(spec.to_string(), "Dapr.Client -> 1.14.0");
    }

    #[test]
    fn test_default_plan_order_and_size() {
        let plan = UpgradePlan::default_plan();
        assert_eq!(plan.len(), 29);
        assert_eq!(
            plan.upgrades[0],
            UpgradeSpec::new("Microsoft.AspNetCore.Authentication.JwtBearer", "8.0.11")
        );
        assert_eq!(
            plan.upgrades.last().unwrap(),
            &UpgradeSpec::new("Microsoft.NET.Test.Sdk", "17.11.1")
        );
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let content = r#"
[[upgrade]]
package = "Dapr.Client"
version = "1.14.0"

[[upgrade]]
package = "xunit"
version = "2.9.2"
"#;
        let plan = UpgradePlan::from_toml(content, Path::new("plan.toml")).unwrap();
        assert_eq!(
            plan.upgrades,
            vec![
                UpgradeSpec::new("Dapr.Client", "1.14.0"),
                UpgradeSpec::new("xunit", "2.9.2"),
            ]
        );
    }

    #[test]
    fn test_from_toml_empty_is_empty_plan() {
        let plan = UpgradePlan::from_toml("", Path::new("plan.toml")).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_from_toml_missing_field() {
        let content = "[[upgrade]]\npackage = \"xunit\"\n";
        let err = UpgradePlan::from_toml(content, Path::new("plan.toml")).unwrap_err();
        assert!(matches!(err, PlanError::TomlParseError { .. }));
    }

    #[test]
    fn test_from_toml_blank_version() {
        let content = "[[upgrade]]\npackage = \"xunit\"\nversion = \" \"\n";
        let err = UpgradePlan::from_toml(content, Path::new("plan.toml")).unwrap_err();
        assert!(matches!(err, PlanError::InvalidEntry { index: 0, .. }));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = UpgradePlan::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, PlanError::ReadError { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(
            &path,
            "[[upgrade]]\npackage = \"Azure.Identity\"\nversion = \"1.11.4\"\n",
        )
        .unwrap();
        let plan = UpgradePlan::from_file(&path).unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_filter_only() {
        let filter = PlanFilter::new().with_only(vec!["xunit".to_string()]);
        let plan = UpgradePlan::default_plan().filtered(&filter);
        assert_eq!(plan.upgrades, vec![UpgradeSpec::new("xunit", "2.9.2")]);
    }

    #[test]
    fn test_filter_exclude_case_insensitive() {
        let filter = PlanFilter::new().with_exclude(vec!["XUNIT".to_string()]);
        let plan = UpgradePlan::default_plan().filtered(&filter);
        assert_eq!(plan.len(), 28);
        assert!(plan.iter().all(|s| s.package != "xunit"));
    }

    #[test]
    fn test_filter_only_wins_over_exclude() {
        let filter = PlanFilter::new()
            .with_only(vec!["xunit".to_string()])
            .with_exclude(vec!["xunit".to_string()]);
        assert!(filter.should_process_package("xunit"));
    }

    #[test]
    fn test_filter_default_accepts_all() {
        let plan = UpgradePlan::default_plan();
        assert_eq!(plan.filtered(&PlanFilter::new()), plan);
    }
}
