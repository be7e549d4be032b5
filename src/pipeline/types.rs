//! Core status types for pipeline runs
//!
//! This module contains the fundamental status vocabulary shared by
//! runs, job instances and reports.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Status of a single job instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Eligible but not yet started
    Pending,
    /// Waiting for upstream instances to reach a terminal state
    Blocked,
    /// Currently executing steps
    Running,
    /// All blocking steps completed with exit code zero
    Succeeded,
    /// A blocking step failed, timed out or was cancelled mid-run
    Failed,
    /// Never started: trigger evaluated false, an upstream failed, or the run was cancelled
    Skipped,
}

impl JobStatus {
    /// Returns true if the instance has reached a terminal state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }

    /// Returns true if the instance succeeded
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if the instance failed
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns true if the instance was skipped
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Blocked => write!(f, "BLOCKED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Overall status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Created, no instance started yet
    Pending,
    /// At least one instance started, not all terminal
    Running,
    /// All instances terminal, none failed
    Succeeded,
    /// All instances terminal, at least one failed
    Failed,
}

impl RunStatus {
    /// Returns true if the run has reached a terminal state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if the run succeeded
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Why a job instance failed
///
/// Timeouts carry a reason distinct from a plain non-zero exit code so
/// reports can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "lowercase")]
pub enum FailureReason {
    /// A blocking step returned a non-zero exit code
    ExitCode {
        /// Exit code returned by the step
        code: i32,
    },

    /// A blocking step exceeded its maximum duration
    Timeout {
        /// The configured limit that was exceeded
        limit: Duration,
    },

    /// The run was cancelled while this instance was in flight
    Cancelled,

    /// The step executor failed before an exit code was observed
    Error {
        /// Executor error message
        message: String,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCode { code } => write!(f, "exit code {code}"),
            Self::Timeout { limit } => write!(f, "timeout after {limit:?}"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Error { message } => write!(f, "executor error: {message}"),
        }
    }
}

/// Trait for types that can be validated
#[allow(clippy::missing_errors_doc)]
pub trait Validate {
    /// Type of validation error
    type Error;

    /// Validates this type
    fn validate(&self) -> std::result::Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Skipped.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Blocked.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_run_status_display() {
        assert_eq!(RunStatus::Succeeded.to_string(), "SUCCEEDED");
        assert_eq!(RunStatus::Failed.to_string(), "FAILED");
    }

    #[test]
    fn test_failure_reason_distinguishes_timeout() {
        let timeout = FailureReason::Timeout {
            limit: Duration::from_secs(30),
        };
        let exit = FailureReason::ExitCode { code: 2 };
        assert_ne!(timeout, exit);
        assert!(timeout.to_string().contains("timeout"));
        assert!(exit.to_string().contains("exit code 2"));
    }

    #[test]
    fn test_failure_reason_serializes_tagged() {
        let json = serde_json::to_value(FailureReason::ExitCode { code: 1 }).unwrap();
        assert_eq!(json["reason"], "exitcode");
        assert_eq!(json["code"], 1);
    }
}
