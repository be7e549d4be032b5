//! Continuation trigger
//!
//! A second pipeline that activates on the terminal outcome of a prior
//! run: `Idle -> Armed -> Firing -> Done`. It arms only for succeeded
//! runs, resolves the deployment tag with the fallback rule, fires the
//! deployment-simulation step, and notifies when the originating event
//! was associated with a pull request.
//!
//! Completion events are assumed to be delivered at least once; firing
//! is deduplicated by run id, so re-delivery never deploys twice.

use crate::engine::traits::{
    ArtifactStore, Notifier, StepExecutor, WorkingEnv, notify_with_retry,
};
use crate::pipeline::{
    DeploymentReport, EngineError, Environment, PublisherError, Step, SummaryValue, TagSet,
    TriggerEvent,
};
use ahash::AHashSet;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// States of the continuation machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationState {
    /// Waiting for a run-completion event
    Idle,
    /// A succeeded run was observed; deployment not yet started
    Armed,
    /// Deployment simulation in progress
    Firing,
    /// Terminal; the last firing completed
    Done,
}

impl fmt::Display for ContinuationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Armed => write!(f, "ARMED"),
            Self::Firing => write!(f, "FIRING"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

/// Outcome of the tag fallback rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullResolution {
    /// The tag that will be pulled
    pub tag: String,
    /// True when the commit tag was used because the branch tag was
    /// undefined or absent from the store
    pub fallback_applied: bool,
}

/// Resolves which tag to pull for deployment.
///
/// Prefers the branch tag when it is defined and present in the store;
/// otherwise falls back to the commit tag. The decision is logged,
/// never silent. Store lookups are retried once; a persistently
/// unreachable store also falls back.
pub async fn resolve_pull_tag(tags: &TagSet, store: &dyn ArtifactStore) -> PullResolution {
    if let Some(branch_tag) = &tags.branch_tag {
        match pull_with_retry(store, branch_tag).await {
            Ok(Some(_)) => {
                tracing::info!(tag = %branch_tag, "Branch tag present in store, using it");
                return PullResolution {
                    tag: branch_tag.clone(),
                    fallback_applied: false,
                };
            }
            Ok(None) => {
                tracing::info!(
                    tag = %branch_tag,
                    fallback = %tags.commit_tag,
                    "Branch tag absent from store, falling back to commit tag"
                );
            }
            Err(err) => {
                tracing::warn!(
                    tag = %branch_tag,
                    error = %err,
                    fallback = %tags.commit_tag,
                    "Store lookup failed, falling back to commit tag"
                );
            }
        }
    } else {
        tracing::info!(
            fallback = %tags.commit_tag,
            "No branch tag derivable, falling back to commit tag"
        );
    }

    PullResolution {
        tag: tags.commit_tag.clone(),
        fallback_applied: true,
    }
}

async fn pull_with_retry(
    store: &dyn ArtifactStore,
    tag: &str,
) -> Result<Option<crate::engine::traits::ArtifactRef>, PublisherError> {
    match store.pull(tag).await {
        Ok(found) => Ok(found),
        Err(first) => {
            tracing::warn!(tag = %tag, error = %first, "Store pull failed, retrying once");
            store.pull(tag).await
        }
    }
}

/// Deployment continuation keyed to run-completion events
pub struct ContinuationTrigger {
    executor: Arc<dyn StepExecutor>,
    store: Arc<dyn ArtifactStore>,
    notifier: Arc<dyn Notifier>,
    channel: String,
    deploy_step: Step,
    state: Mutex<ContinuationState>,
    fired: Mutex<AHashSet<String>>,
}

impl ContinuationTrigger {
    /// Creates a continuation trigger.
    ///
    /// `deploy_step` is the deployment-simulation step; its command may
    /// reference `${TAG}`, the resolved pull tag.
    pub fn new(
        executor: Arc<dyn StepExecutor>,
        store: Arc<dyn ArtifactStore>,
        notifier: Arc<dyn Notifier>,
        channel: impl Into<String>,
        deploy_step: Step,
    ) -> Self {
        Self {
            executor,
            store,
            notifier,
            channel: channel.into(),
            deploy_step,
            state: Mutex::new(ContinuationState::Idle),
            fired: Mutex::new(AHashSet::new()),
        }
    }

    /// Current state of the machine
    #[must_use]
    pub fn state(&self) -> ContinuationState {
        *self.state.lock()
    }

    /// Handles a run-completion event.
    ///
    /// Returns `Ok(None)` when the event does not fire the continuation:
    /// not a completion event, the run did not succeed, or the run id
    /// already fired (at-least-once re-delivery). Otherwise runs the
    /// deployment simulation and returns its report; the report is
    /// produced even when the simulation fails.
    ///
    /// # Errors
    ///
    /// Never fails for executor or boundary problems; those fold into
    /// the report. Reserved for future fatal conditions.
    pub async fn on_run_completed(
        &self,
        event: &TriggerEvent,
    ) -> Result<Option<DeploymentReport>, EngineError> {
        let TriggerEvent::RunCompleted {
            run_id,
            status,
            branch,
            commit,
            pr_number,
        } = event
        else {
            tracing::debug!(event = %event, "Not a run-completion event, ignoring");
            return Ok(None);
        };

        if !status.is_succeeded() {
            tracing::info!(run_id = %run_id, status = %status, "Upstream run did not succeed, continuation stays idle");
            *self.state.lock() = ContinuationState::Idle;
            return Ok(None);
        }

        // At-least-once delivery: deduplicate by run id before arming.
        {
            let mut fired = self.fired.lock();
            if !fired.insert(run_id.clone()) {
                tracing::info!(run_id = %run_id, "Duplicate completion event, already fired");
                return Ok(None);
            }
        }

        *self.state.lock() = ContinuationState::Armed;
        tracing::info!(run_id = %run_id, "Continuation armed");

        *self.state.lock() = ContinuationState::Firing;
        let tags = TagSet::resolve(Some(branch.as_str()), commit);
        let resolution = resolve_pull_tag(&tags, self.store.as_ref()).await;
        tracing::info!(
            run_id = %run_id,
            tag = %resolution.tag,
            fallback = resolution.fallback_applied,
            "Firing deployment simulation"
        );

        let report = self.fire(&resolution).await;
        *self.state.lock() = ContinuationState::Done;
        tracing::info!(
            run_id = %run_id,
            success = report.success,
            "Continuation done"
        );

        if pr_number.is_some() {
            let payload = serde_json::to_value(&report)
                .unwrap_or_else(|_| serde_json::Value::Null);
            notify_with_retry(self.notifier.as_ref(), &self.channel, &payload).await;
        } else {
            tracing::debug!(run_id = %run_id, "No originating pull request, completing silently");
        }

        Ok(Some(report))
    }

    async fn fire(&self, resolution: &PullResolution) -> DeploymentReport {
        let env = Environment::new().set("TAG", resolution.tag.clone());
        let command = env.resolve(&self.deploy_step.command);
        let working_env = WorkingEnv::new(env);

        let result = match self.deploy_step.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.executor.execute(&command, &working_env))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(EngineError::Executor(format!(
                        "deployment simulation timed out after {limit:?}"
                    ))),
                }
            }
            None => self.executor.execute(&command, &working_env).await,
        };

        match result {
            Ok(step_result) => {
                let deployment_output = step_result
                    .outputs
                    .get("result")
                    .cloned()
                    .or_else(|| step_result.stdout_tail.last().cloned())
                    .map_or(SummaryValue::Unavailable, SummaryValue::Available);
                DeploymentReport {
                    tag_used: resolution.tag.clone(),
                    fallback_applied: resolution.fallback_applied,
                    deployment_output,
                    success: step_result.is_success(),
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "Deployment simulation could not run");
                DeploymentReport {
                    tag_used: resolution.tag.clone(),
                    fallback_applied: resolution.fallback_applied,
                    deployment_output: SummaryValue::Unavailable,
                    success: false,
                }
            }
        }
    }
}
