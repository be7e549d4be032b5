//! Trigger events and trigger conditions
//!
//! A [`TriggerEvent`] is the external fact that created a run; a
//! [`TriggerCondition`] is a pure predicate over the run that decides
//! whether a job participates. Conditions are evaluated once per run,
//! never re-evaluated mid-flight.

use super::errors::ValidationError;
use super::types::{RunStatus, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The event that triggered a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerEvent {
    /// A branch push
    Push {
        /// Source branch
        branch: String,
        /// Commit identifier
        commit: String,
    },

    /// A pull request update
    PullRequest {
        /// Source branch
        branch: String,
        /// Commit identifier
        commit: String,
        /// Pull request number
        number: u64,
    },

    /// Completion of an upstream pipeline run
    ///
    /// Carries the head branch and commit of the completed run so a
    /// continuation can re-resolve artifact tags without reaching into
    /// the dead run's state.
    RunCompleted {
        /// Identifier of the completed run
        run_id: String,
        /// Terminal status of the completed run
        status: RunStatus,
        /// Head branch of the completed run
        branch: String,
        /// Head commit of the completed run
        commit: String,
        /// Pull request the completed run originated from, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        pr_number: Option<u64>,
    },
}

impl TriggerEvent {
    /// Creates a push event
    pub fn push(branch: impl Into<String>, commit: impl Into<String>) -> Self {
        Self::Push {
            branch: branch.into(),
            commit: commit.into(),
        }
    }

    /// Creates a pull request event
    pub fn pull_request(
        branch: impl Into<String>,
        commit: impl Into<String>,
        number: u64,
    ) -> Self {
        Self::PullRequest {
            branch: branch.into(),
            commit: commit.into(),
            number,
        }
    }

    /// Creates an upstream-run-completion event
    pub fn run_completed(
        run_id: impl Into<String>,
        status: RunStatus,
        branch: impl Into<String>,
        commit: impl Into<String>,
        pr_number: Option<u64>,
    ) -> Self {
        Self::RunCompleted {
            run_id: run_id.into(),
            status,
            branch: branch.into(),
            commit: commit.into(),
            pr_number,
        }
    }

    /// Source branch of the event
    #[must_use]
    pub fn branch(&self) -> &str {
        match self {
            Self::Push { branch, .. }
            | Self::PullRequest { branch, .. }
            | Self::RunCompleted { branch, .. } => branch,
        }
    }

    /// Commit identifier of the event
    #[must_use]
    pub fn commit(&self) -> &str {
        match self {
            Self::Push { commit, .. }
            | Self::PullRequest { commit, .. }
            | Self::RunCompleted { commit, .. } => commit,
        }
    }

    /// Pull request number, when the event is associated with one
    #[must_use]
    pub fn pr_number(&self) -> Option<u64> {
        match self {
            Self::Push { .. } => None,
            Self::PullRequest { number, .. } => Some(*number),
            Self::RunCompleted { pr_number, .. } => *pr_number,
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push { branch, commit } => write!(f, "push({branch}@{commit})"),
            Self::PullRequest { branch, number, .. } => write!(f, "pr(#{number}, {branch})"),
            Self::RunCompleted { run_id, status, .. } => {
                write!(f, "run_completed({run_id}, {status})")
            }
        }
    }
}

/// Activation condition for a job
///
/// Evaluated against the run's trigger event. Composable with
/// [`AllOf`][TriggerCondition::AllOf], [`AnyOf`][TriggerCondition::AnyOf]
/// and [`Not`][TriggerCondition::Not].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Always eligible
    Always,

    /// Eligible for push events
    Push,

    /// Eligible for pull request events
    PullRequest,

    /// Eligible when the source branch matches a pattern
    ///
    /// Patterns match exactly, or as a prefix when they end with `*`
    /// (e.g. `feature/*`).
    Branch {
        /// Branch name or prefix pattern
        pattern: String,
    },

    /// Eligible when the run was triggered by a successfully completed
    /// upstream run
    UpstreamSucceeded,

    /// All conditions must hold
    AllOf {
        /// List of conditions
        conditions: Vec<TriggerCondition>,
    },

    /// At least one condition must hold
    AnyOf {
        /// List of conditions
        conditions: Vec<TriggerCondition>,
    },

    /// Negation
    Not {
        /// Condition to negate
        condition: Box<TriggerCondition>,
    },
}

impl Default for TriggerCondition {
    fn default() -> Self {
        Self::Always
    }
}

impl TriggerCondition {
    /// Creates a branch condition
    pub fn branch(pattern: impl Into<String>) -> Self {
        Self::Branch {
            pattern: pattern.into(),
        }
    }

    /// Creates an all-of condition
    #[must_use]
    pub fn all_of(conditions: Vec<TriggerCondition>) -> Self {
        Self::AllOf { conditions }
    }

    /// Creates an any-of condition
    #[must_use]
    pub fn any_of(conditions: Vec<TriggerCondition>) -> Self {
        Self::AnyOf { conditions }
    }

    /// Creates a negated condition
    #[must_use]
    pub fn not(condition: TriggerCondition) -> Self {
        Self::Not {
            condition: Box::new(condition),
        }
    }

    /// Evaluates this condition against a trigger event
    #[must_use]
    pub fn evaluate(&self, event: &TriggerEvent) -> bool {
        match self {
            Self::Always => true,
            Self::Push => matches!(event, TriggerEvent::Push { .. }),
            Self::PullRequest => matches!(event, TriggerEvent::PullRequest { .. }),
            Self::Branch { pattern } => branch_matches(pattern, event.branch()),
            Self::UpstreamSucceeded => matches!(
                event,
                TriggerEvent::RunCompleted {
                    status: RunStatus::Succeeded,
                    ..
                }
            ),
            Self::AllOf { conditions } => conditions.iter().all(|c| c.evaluate(event)),
            Self::AnyOf { conditions } => conditions.iter().any(|c| c.evaluate(event)),
            Self::Not { condition } => !condition.evaluate(event),
        }
    }
}

fn branch_matches(pattern: &str, branch: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => branch.starts_with(prefix),
        None => pattern == branch,
    }
}

impl Validate for TriggerCondition {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        match self {
            Self::Branch { pattern } => {
                if pattern.is_empty() {
                    return Err(ValidationError::InvalidCondition(
                        "Branch pattern cannot be empty".to_string(),
                    ));
                }
            }
            Self::AllOf { conditions } | Self::AnyOf { conditions } => {
                if conditions.is_empty() {
                    return Err(ValidationError::InvalidCondition(
                        "Condition list cannot be empty".to_string(),
                    ));
                }
                for cond in conditions {
                    cond.validate()?;
                }
            }
            Self::Not { condition } => condition.validate()?,
            Self::Always | Self::Push | Self::PullRequest | Self::UpstreamSucceeded => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push() -> TriggerEvent {
        TriggerEvent::push("main", "abc1234")
    }

    fn pr() -> TriggerEvent {
        TriggerEvent::pull_request("feature/x", "abc1234", 42)
    }

    #[test]
    fn test_event_accessors() {
        let event = pr();
        assert_eq!(event.branch(), "feature/x");
        assert_eq!(event.commit(), "abc1234");
        assert_eq!(event.pr_number(), Some(42));
        assert_eq!(push().pr_number(), None);
    }

    #[test]
    fn test_run_completed_carries_origin_pr() {
        let event =
            TriggerEvent::run_completed("r1", RunStatus::Succeeded, "main", "abc1234", Some(7));
        assert_eq!(event.pr_number(), Some(7));
    }

    #[test]
    fn test_always_condition() {
        assert!(TriggerCondition::Always.evaluate(&push()));
        assert!(TriggerCondition::Always.evaluate(&pr()));
    }

    #[test]
    fn test_push_and_pull_request_conditions() {
        assert!(TriggerCondition::Push.evaluate(&push()));
        assert!(!TriggerCondition::Push.evaluate(&pr()));
        assert!(TriggerCondition::PullRequest.evaluate(&pr()));
        assert!(!TriggerCondition::PullRequest.evaluate(&push()));
    }

    #[test]
    fn test_branch_exact_match() {
        let cond = TriggerCondition::branch("main");
        assert!(cond.evaluate(&push()));
        assert!(!cond.evaluate(&pr()));
    }

    #[test]
    fn test_branch_prefix_pattern() {
        let cond = TriggerCondition::branch("feature/*");
        assert!(cond.evaluate(&pr()));
        assert!(!cond.evaluate(&push()));
    }

    #[test]
    fn test_upstream_succeeded() {
        let ok = TriggerEvent::run_completed("r1", RunStatus::Succeeded, "main", "abc", None);
        let bad = TriggerEvent::run_completed("r2", RunStatus::Failed, "main", "abc", None);
        assert!(TriggerCondition::UpstreamSucceeded.evaluate(&ok));
        assert!(!TriggerCondition::UpstreamSucceeded.evaluate(&bad));
        assert!(!TriggerCondition::UpstreamSucceeded.evaluate(&push()));
    }

    #[test]
    fn test_composed_conditions() {
        let cond = TriggerCondition::all_of(vec![
            TriggerCondition::PullRequest,
            TriggerCondition::branch("feature/*"),
        ]);
        assert!(cond.evaluate(&pr()));
        assert!(!cond.evaluate(&push()));

        let negated = TriggerCondition::not(TriggerCondition::PullRequest);
        assert!(negated.evaluate(&push()));
        assert!(!negated.evaluate(&pr()));
    }

    #[test]
    fn test_validation_rejects_empty_pattern() {
        assert!(TriggerCondition::branch("").validate().is_err());
        assert!(TriggerCondition::all_of(vec![]).validate().is_err());
        assert!(TriggerCondition::branch("main").validate().is_ok());
    }
}
