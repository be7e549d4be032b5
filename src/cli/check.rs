//! Pipeline file validation
//!
//! Loads a YAML pipeline definition, validates every job spec and
//! builds the job graph, reporting what would run without executing
//! anything.

use anyhow::{Context, Result};
use conveyor::engine::JobGraph;
use conveyor::pipeline::JobSpec;
use conveyor::pipeline::SummarySpec;
use serde::Deserialize;
use std::path::Path;

/// A pipeline definition file
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineFile {
    /// Job specs, in declaration order
    pub jobs: Vec<JobSpec>,

    /// Optional summary wiring
    #[serde(default)]
    pub summary: Option<SummarySpec>,

    /// Optional notification channel for the summary
    #[serde(default)]
    pub channel: Option<String>,
}

/// Loads and parses a pipeline file
pub fn load(path: &Path) -> Result<PipelineFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read pipeline file {}", path.display()))?;
    let pipeline: PipelineFile = serde_yaml::from_str(&content)
        .with_context(|| format!("cannot parse pipeline file {}", path.display()))?;
    Ok(pipeline)
}

/// Validates a pipeline file and prints what would run
pub fn check_pipeline(path: &Path) -> Result<()> {
    let pipeline = load(path)?;
    let job_count = pipeline.jobs.len();

    let graph = JobGraph::build(pipeline.jobs)
        .with_context(|| format!("invalid pipeline {}", path.display()))?;

    println!(
        "OK: {} jobs, {} instances",
        job_count,
        graph.instances().len()
    );
    for instance in graph.instances() {
        let deps = instance
            .deps
            .iter()
            .map(|&d| graph.instances()[d].id.as_str())
            .collect::<Vec<_>>();
        if deps.is_empty() {
            println!("  {}", instance.id);
        } else {
            println!("  {} <- {}", instance.id, deps.join(", "));
        }
    }
    Ok(())
}
