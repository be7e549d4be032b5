//! Pipeline execution command
//!
//! Runs a pipeline file with the local executor, prints the summary
//! (or the raw report when no summary is wired) and posts it to the
//! configured channel.

use crate::cli::check;
use anyhow::{Result, bail};
use conveyor::engine::{LocalExecutor, Scheduler, StepExecutor, notify_with_retry};
use conveyor::infrastructure::{HttpNotifier, RunMetrics};
use conveyor::pipeline::{PipelineRun, RunSummary, TriggerEvent};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Executes a pipeline file
pub async fn execute(path: &Path, event: TriggerEvent, pool: Option<usize>) -> Result<()> {
    let pipeline = check::load(path)?;

    let mut scheduler = Scheduler::new(Arc::new(LocalExecutor::new()) as Arc<dyn StepExecutor>);
    if let Some(pool) = pool {
        scheduler = scheduler.with_pool_size(pool);
    }

    let mut run = PipelineRun::new(event);
    let started = Instant::now();
    let report = scheduler.run(&mut run, pipeline.jobs).await?;

    let metrics = RunMetrics::from_report(&report, started.elapsed());
    tracing::info!(
        run_id = %metrics.run_id,
        duration_ms = metrics.duration.as_millis(),
        total = metrics.total_jobs,
        succeeded = metrics.succeeded,
        failed = metrics.failed,
        skipped = metrics.skipped,
        "Run finished"
    );

    let payload = match pipeline.summary {
        Some(spec) => {
            let summary = RunSummary::build(&report, &spec);
            for error in summary.data_quality() {
                tracing::warn!(error = %error, "Data quality problem in summary");
            }
            serde_json::to_value(&summary)?
        }
        None => serde_json::to_value(&report)?,
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);

    if let Some(channel) = pipeline.channel {
        let notifier = HttpNotifier::new();
        notify_with_retry(&notifier, &channel, &payload).await;
    }

    if !report.status.is_succeeded() {
        bail!("pipeline run failed");
    }
    Ok(())
}
