//! Engine boundary traits
//!
//! The orchestration core never inspects its collaborators: steps run
//! through a [`StepExecutor`], artifacts move through an
//! [`ArtifactStore`], reports leave through a [`Notifier`]. Each is an
//! async trait implemented by infrastructure or by test doubles.

use crate::pipeline::{EngineError, Environment, NotifierError, PublisherError, TagSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Working environment handed to a step executor
#[derive(Debug, Clone, Default)]
pub struct WorkingEnv {
    /// Environment variables visible to the step
    pub env: Environment,

    /// Working directory, executor default when absent
    pub cwd: Option<PathBuf>,
}

impl WorkingEnv {
    /// Creates a working environment from variables
    #[must_use]
    pub fn new(env: Environment) -> Self {
        Self { env, cwd: None }
    }

    /// Sets the working directory
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Observed result of one step execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Exit code reported by the executor
    pub exit_code: i32,

    /// Tail of captured standard output, most recent last
    pub stdout_tail: Vec<String>,

    /// Structured outputs emitted by the step
    pub outputs: HashMap<String, String>,

    /// Wall-clock duration of the step
    pub duration: Duration,
}

impl StepResult {
    /// Returns true if the step exited with code zero
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes one command-like unit and captures its result
///
/// The core invokes this for every step; it never looks inside.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Executes a command in the given working environment.
    ///
    /// # Errors
    ///
    /// Returns an error only when execution could not be attempted at
    /// all; a step that ran and failed is a successful `Ok` with a
    /// non-zero exit code.
    async fn execute(&self, command: &str, env: &WorkingEnv) -> Result<StepResult, EngineError>;
}

/// An artifact to publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifact {
    /// Artifact name, e.g. an image repository
    pub name: String,

    /// Content digest or build identifier
    pub digest: String,
}

impl BuildArtifact {
    /// Creates an artifact description
    pub fn new(name: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            digest: digest.into(),
        }
    }
}

/// Reference to a stored artifact, usable downstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Opaque reference string
    pub reference: String,
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)
    }
}

/// Artifact publisher boundary
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Publishes an artifact under every tag in the set.
    ///
    /// # Errors
    ///
    /// Returns a [`PublisherError`] when the store cannot be reached or
    /// rejects the artifact.
    async fn publish(
        &self,
        artifact: &BuildArtifact,
        tags: &TagSet,
    ) -> Result<ArtifactRef, PublisherError>;

    /// Looks up an artifact by tag; `Ok(None)` when the tag is absent.
    ///
    /// # Errors
    ///
    /// Returns a [`PublisherError`] only for transport failures; an
    /// absent tag is not an error.
    async fn pull(&self, tag: &str) -> Result<Option<ArtifactRef>, PublisherError>;
}

/// Notifier boundary
///
/// Failures here are logged and retried at most once; they never
/// escalate to a pipeline failure.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Posts a report to a channel.
    ///
    /// # Errors
    ///
    /// Returns a [`NotifierError`] when the channel rejects the report
    /// or cannot be reached.
    async fn post(&self, channel: &str, report: &serde_json::Value) -> Result<(), NotifierError>;
}

/// Posts a report, retrying once on failure.
///
/// Returns whether the report was ultimately delivered. Failures are
/// logged, never propagated.
pub async fn notify_with_retry(
    notifier: &dyn Notifier,
    channel: &str,
    report: &serde_json::Value,
) -> bool {
    match notifier.post(channel, report).await {
        Ok(()) => true,
        Err(first) => {
            tracing::warn!(channel = %channel, error = %first, "Notification failed, retrying once");
            match notifier.post(channel, report).await {
                Ok(()) => true,
                Err(second) => {
                    tracing::error!(channel = %channel, error = %second, "Notification failed after retry");
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct FlakyNotifier {
        failures_left: Mutex<usize>,
        posts: Mutex<usize>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn post(
            &self,
            _channel: &str,
            _report: &serde_json::Value,
        ) -> Result<(), NotifierError> {
            *self.posts.lock() += 1;
            let mut left = self.failures_left.lock();
            if *left > 0 {
                *left -= 1;
                return Err(NotifierError::Transport("connection reset".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_notify_retries_once_then_succeeds() {
        let notifier = FlakyNotifier {
            failures_left: Mutex::new(1),
            posts: Mutex::new(0),
        };
        let delivered = notify_with_retry(&notifier, "#ci", &serde_json::json!({})).await;
        assert!(delivered);
        assert_eq!(*notifier.posts.lock(), 2);
    }

    #[tokio::test]
    async fn test_notify_gives_up_after_one_retry() {
        let notifier = FlakyNotifier {
            failures_left: Mutex::new(5),
            posts: Mutex::new(0),
        };
        let delivered = notify_with_retry(&notifier, "#ci", &serde_json::json!({})).await;
        assert!(!delivered);
        assert_eq!(*notifier.posts.lock(), 2);
    }

    #[test]
    fn test_step_result_success() {
        let result = StepResult {
            exit_code: 0,
            stdout_tail: vec![],
            outputs: HashMap::new(),
            duration: Duration::ZERO,
        };
        assert!(result.is_success());
    }
}
