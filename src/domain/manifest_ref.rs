//! Manifest reference

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Path to a project manifest found on disk
///
/// Only used to invoke the package manager and to label report lines; the
/// file itself is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestRef(PathBuf);

impl ManifestRef {
    /// Creates a new ManifestRef
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Full path of the manifest
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name for short report lines
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for ManifestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for ManifestRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl AsRef<Path> for ManifestRef {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
