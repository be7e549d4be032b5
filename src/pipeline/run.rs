//! Pipeline runs and run reports
//!
//! A [`PipelineRun`] identifies one execution of a pipeline. The
//! scheduler owns its job instances for the duration of the run and
//! leaves behind a [`RunReport`], the archived terminal view.

use super::trigger::TriggerEvent;
use super::types::{FailureReason, JobStatus, RunStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// One execution of a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRun {
    /// Unique run identifier
    pub id: Uuid,

    /// The event that created this run
    pub event: TriggerEvent,

    /// Overall status, updated as instances complete
    pub status: RunStatus,
}

impl PipelineRun {
    /// Creates a pending run from a trigger event
    #[must_use]
    pub fn new(event: TriggerEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            status: RunStatus::Pending,
        }
    }

    /// Marks the run as running
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
    }

    /// Marks the run terminal with the given status
    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
    }

    /// Source branch of the trigger event
    #[must_use]
    pub fn branch(&self) -> &str {
        self.event.branch()
    }

    /// Commit identifier of the trigger event
    #[must_use]
    pub fn commit(&self) -> &str {
        self.event.commit()
    }

    /// Pull request number, when the run is associated with one
    #[must_use]
    pub fn pr_number(&self) -> Option<u64> {
        self.event.pr_number()
    }
}

/// Terminal view of one job instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceReport {
    /// Instance identifier (spec name plus axis values)
    pub id: String,

    /// Name of the owning job spec
    pub spec: String,

    /// Axis values of this matrix leg, empty for plain jobs
    pub axes: Vec<(String, String)>,

    /// Terminal status
    pub status: JobStatus,

    /// Failure reason, when the instance failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,

    /// Declared outputs captured at termination
    pub outputs: BTreeMap<String, String>,

    /// Wall-clock duration, absent for instances that never ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
}

/// Aggregated terminal view of a run
///
/// Instances appear in declaration order, matrix legs in expansion
/// order, so reports are stable across runs of the same pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Identifier of the run this report describes
    pub run_id: Uuid,

    /// Overall terminal status
    pub status: RunStatus,

    /// Terminal instance views
    pub instances: Vec<InstanceReport>,
}

impl RunReport {
    /// Looks up an instance by its full identifier
    #[must_use]
    pub fn instance(&self, id: &str) -> Option<&InstanceReport> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// All instances expanded from the named job spec
    #[must_use]
    pub fn spec_instances(&self, spec: &str) -> Vec<&InstanceReport> {
        self.instances.iter().filter(|i| i.spec == spec).collect()
    }

    /// Looks up an output value by job spec name and key
    ///
    /// Returns `None` when the spec has no instance, expanded into more
    /// than one instance (ambiguous), or never produced the key.
    #[must_use]
    pub fn output(&self, spec: &str, key: &str) -> Option<&str> {
        let instances = self.spec_instances(spec);
        match instances.as_slice() {
            [only] => only.outputs.get(key).map(String::as_str),
            _ => None,
        }
    }
}
