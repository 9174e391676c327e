//! Recursive file discovery
//!
//! Finds project manifests (`*.csproj`) or config files (`nuget.config`)
//! under a root directory by a case-insensitive file-name glob.

use crate::domain::ManifestRef;
use crate::error::LocatorError;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Default file-name pattern for project manifests
pub const MANIFEST_PATTERN: &str = "*.csproj";

/// Default file-name pattern for NuGet config files
pub const CONFIG_PATTERN: &str = "nuget.config";

/// Case-insensitive file-name glob supporting `*` and `?`
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    /// Compile a glob such as `*.csproj`
    pub fn new(pattern: &str) -> Result<Self, LocatorError> {
        if pattern.is_empty() {
            return Err(LocatorError::invalid_pattern(pattern, "empty pattern"));
        }
        if pattern.contains('/') || pattern.contains('\\') {
            return Err(LocatorError::invalid_pattern(
                pattern,
                "pattern matches file names only",
            ));
        }

        let mut expr = String::from("(?i)^");
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');

        let regex =
            Regex::new(&expr).map_err(|e| LocatorError::invalid_pattern(pattern, e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Check a bare file name against the pattern
    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Find all files under `root` whose name matches `pattern`
///
/// Results are sorted by path so runs over the same tree are reproducible.
/// Unreadable subdirectories are logged and skipped.
pub fn find_files(root: &Path, pattern: &NamePattern) -> Result<Vec<PathBuf>, LocatorError> {
    if !root.exists() {
        return Err(LocatorError::directory_not_found(root));
    }
    if !root.is_dir() {
        return Err(LocatorError::not_a_directory(root));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // The root itself failing means nothing can be found.
                if e.depth() == 0 {
                    return Err(LocatorError::WalkError {
                        path: root.to_path_buf(),
                        message: e.to_string(),
                    });
                }
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if pattern.matches(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!(
        root = %root.display(),
        pattern = pattern.as_str(),
        count = files.len(),
        "located files"
    );
    Ok(files)
}

/// Find project manifests under `root`
pub fn find_manifests(root: &Path, pattern: &str) -> Result<Vec<ManifestRef>, LocatorError> {
    let pattern = NamePattern::new(pattern)?;
    Ok(find_files(root, &pattern)?
        .into_iter()
        .map(ManifestRef::from)
        .collect())
}
