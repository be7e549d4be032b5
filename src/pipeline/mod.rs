//! Pipeline domain types and logic

// Make submodules public
pub mod environment;
pub mod errors;
pub mod job;
pub mod matrix;
pub mod run;
pub mod summary;
pub mod tags;
pub mod trigger;
pub mod types;

// Re-export public types from submodules
pub use environment::{Environment, env_key};
pub use errors::{
    ConfigError, DataQualityError, EngineError, GraphError, NotifierError, PublisherError,
    ValidationError,
};
pub use job::{JobSpec, Step};
pub use matrix::{MatrixAxis, MatrixConfig, MatrixExclude, leg_suffix};
pub use run::{InstanceReport, PipelineRun, RunReport};
pub use summary::{DeploymentReport, RunSummary, SummarySource, SummarySpec, SummaryValue};
pub use tags::{TagSet, sanitize};
pub use trigger::{TriggerCondition, TriggerEvent};
pub use types::{FailureReason, JobStatus, RunStatus, Validate};
