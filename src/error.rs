//! Application error types using thiserror
//!
//! Error hierarchy:
//! - PlanError: Issues loading or validating the upgrade plan
//! - LocatorError: Issues enumerating manifest/config files
//! - NormalizeError: Per-file config normalization failures
//!
//! Failures of individual upgrade invocations are not errors here; they are
//! captured as `InvocationOutcome::Failed` and reported.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Upgrade plan related errors
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// File discovery related errors
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// Config normalization errors
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Errors related to loading the upgrade plan
#[derive(Error, Debug)]
pub enum PlanError {
    /// Failed to read plan file
    #[error("failed to read plan file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// An entry with an empty package id or version
    #[error("invalid plan entry #{index}: {message}")]
    InvalidEntry { index: usize, message: String },
}

/// Errors related to locating files under a root directory
#[derive(Error, Debug)]
pub enum LocatorError {
    /// Root directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Root exists but is not a directory
    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// File name pattern could not be compiled
    #[error("invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Directory traversal failed
    #[error("failed to walk {path}: {message}")]
    WalkError { path: PathBuf, message: String },
}

/// Errors produced by the config normalizer
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// No `<configuration>` root element to anchor normalization to
    #[error("no <configuration> root element found")]
    NoRootMarker,

    /// Failed to read config file
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write config file
    #[error("failed to write config file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PlanError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlanError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PlanError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidEntry error
    pub fn invalid_entry(index: usize, message: impl Into<String>) -> Self {
        PlanError::InvalidEntry {
            index,
            message: message.into(),
        }
    }
}

impl LocatorError {
    /// Creates a new DirectoryNotFound error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        LocatorError::DirectoryNotFound { path: path.into() }
    }

    /// Creates a new NotADirectory error
    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        LocatorError::NotADirectory { path: path.into() }
    }

    /// Creates a new InvalidPattern error
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        LocatorError::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

impl NormalizeError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NormalizeError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NormalizeError::WriteError {
            path: path.into(),
            source,
        }
    }
}
