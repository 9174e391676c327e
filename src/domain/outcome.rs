//! Invocation outcome types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an invocation counted as failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The external tool ran and reported an error, or could not be started
    ExternalError,
    /// The external tool did not finish within the timeout
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ExternalError => write!(f, "error"),
            FailureKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// Result of applying one upgrade to one manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// The manifest now references the target version
    Applied,
    /// The manifest does not reference this package at all
    NotApplicable,
    /// The invocation errored or timed out
    Failed {
        /// Failure category
        kind: FailureKind,
        /// Diagnostic, already truncated for display
        message: String,
    },
}

impl InvocationOutcome {
    /// Creates a Failed outcome with an external error
    pub fn external_error(message: impl Into<String>) -> Self {
        InvocationOutcome::Failed {
            kind: FailureKind::ExternalError,
            message: message.into(),
        }
    }

    /// Creates a Failed outcome for a timeout
    pub fn timeout(message: impl Into<String>) -> Self {
        InvocationOutcome::Failed {
            kind: FailureKind::Timeout,
            message: message.into(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, InvocationOutcome::Applied)
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, InvocationOutcome::NotApplicable)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, InvocationOutcome::Failed { .. })
    }
}

impl fmt::Display for InvocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationOutcome::Applied => write!(f, "applied"),
            InvocationOutcome::NotApplicable => write!(f, "not referenced"),
            InvocationOutcome::Failed { kind, message } => write!(f, "{}: {}", kind, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(
            InvocationOutcome::timeout("timed out after 60s"),
            InvocationOutcome::Failed {
                kind: FailureKind::Timeout,
                message: "timed out after 60s".to_string(),
            }
        );
        assert!(InvocationOutcome::external_error("boom").is_failed());
        assert!(InvocationOutcome::Applied.is_applied());
        assert!(InvocationOutcome::NotApplicable.is_not_applicable());
    }

    #[test]
    fn test_display() {
        assert_eq!(InvocationOutcome::Applied.to_string(), "applied");
        assert_eq!(
            InvocationOutcome::external_error("NU1605").to_string(),
            "error: NU1605"
        );
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&InvocationOutcome::timeout("slow")).unwrap();
        assert_eq!(
            json,
            r#"{"outcome":"failed","kind":"timeout","message":"slow"}"#
        );
        let json = serde_json::to_string(&InvocationOutcome::NotApplicable).unwrap();
        assert_eq!(json, r#"{"outcome":"not_applicable"}"#);
    }
}
