//! # Conveyor - a CI/CD pipeline orchestration engine
//!
//! Conveyor executes one pipeline run at a time: a directed acyclic
//! graph of jobs with conditional triggers, matrix fan-out, cross-job
//! output propagation, artifact tag resolution with fallback, and an
//! idempotent continuation pipeline triggered by the completion status
//! of a prior run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use conveyor::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), conveyor::pipeline::EngineError> {
//! let specs = vec![
//!     JobSpec::new("lint_test", vec![Step::run("pytest --python ${PYTHON}")])
//!         .with_matrix(conveyor::axes! { python = ["3.10", "3.11", "3.12"] })
//!         .with_output("coverage"),
//!     JobSpec::new("build", vec![Step::run("make image")])
//!         .needs("lint_test")
//!         .with_output("image_ref"),
//! ];
//!
//! let scheduler = Scheduler::new(Arc::new(LocalExecutor::new()));
//! let mut run = PipelineRun::new(TriggerEvent::push("main", "abc1234"));
//! let report = scheduler.run(&mut run, specs).await?;
//! println!("{}", report.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Job graphs**: dependency-ordered execution, cycle detection
//!   before anything runs
//! - **Matrix fan-out**: one instance per axis combination, reported
//!   independently
//! - **Output propagation**: declared outputs commit at instance
//!   termination and surface as `${JOB_KEY}` variables downstream
//! - **Tag resolution**: deterministic branch-name sanitization with an
//!   observable commit-tag fallback
//! - **Continuations**: a second pipeline keyed to run completion,
//!   deduplicated under at-least-once delivery
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod macros;

pub mod engine;
pub mod infrastructure;
pub mod pipeline;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use engine::{
    ArtifactRef, ArtifactStore, BuildArtifact, CancelFlag, ContinuationState, ContinuationTrigger,
    JobGraph, LocalExecutor, Notifier, PullResolution, Scheduler, StepExecutor, StepResult,
    WorkingEnv, notify_with_retry, resolve_pull_tag,
};
pub use infrastructure::{
    HttpNotifier, InMemoryStore, LogNotifier, MetricsCollector, RegistryConfig, RunMetrics,
    init_logging,
};
pub use pipeline::{
    DeploymentReport, EngineError, Environment, FailureReason, GraphError, InstanceReport,
    JobSpec, JobStatus, MatrixConfig, PipelineRun, RunReport, RunStatus, RunSummary, Step,
    SummarySpec, SummaryValue, TagSet, TriggerCondition, TriggerEvent, sanitize,
};

/// Version of the conveyor crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
