//! Prelude module for common imports

// Re-export macros
pub use crate::{axes, step, steps};

// Re-export all pipeline types with full paths
pub use crate::pipeline::environment::{Environment, env_key};
pub use crate::pipeline::errors::{EngineError, GraphError, ValidationError};
pub use crate::pipeline::job::{JobSpec, Step};
pub use crate::pipeline::matrix::{MatrixAxis, MatrixConfig};
pub use crate::pipeline::run::{InstanceReport, PipelineRun, RunReport};
pub use crate::pipeline::summary::{DeploymentReport, RunSummary, SummarySpec, SummaryValue};
pub use crate::pipeline::tags::{TagSet, sanitize};
pub use crate::pipeline::trigger::{TriggerCondition, TriggerEvent};
pub use crate::pipeline::types::{FailureReason, JobStatus, RunStatus, Validate};

// Re-export engine types
pub use crate::engine::{
    ArtifactStore, BuildArtifact, CancelFlag, ContinuationTrigger, JobGraph, LocalExecutor,
    Notifier, Scheduler, StepExecutor, StepResult, WorkingEnv,
};
