//! End-to-end demo: a CI run followed by its CD continuation.
//!
//! The CI pipeline lint+tests over a python matrix, builds and
//! publishes an image, runs a non-blocking vulnerability scan and
//! posts a PR comment. On success, the continuation re-resolves the
//! tag (with fallback) and fires the deployment simulation.
//!
//! Run with: `cargo run --example ci_pipeline`

use conveyor::prelude::*;
use conveyor::{ContinuationTrigger, InMemoryStore, LogNotifier, RegistryConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    conveyor::init_logging("info");

    let config = RegistryConfig::new("demo-user", "demo-token")?;
    let repo = config.repo("calculator");

    let specs = vec![
        JobSpec::new(
            "lint_test",
            steps![
                step!("sh -c \"echo linting with python ${PYTHON}\""),
                step!("sh -c \"echo '::set-output coverage=93.5'; echo '::set-output tests=128'\""),
            ],
        )
        .with_matrix(axes! { python = ["3.10", "3.11", "3.12"] })
        .with_output("coverage")
        .with_output("tests"),
        JobSpec::new(
            "build",
            steps![step!(format!(
                "sh -c \"echo '::set-output image_ref={repo}:${{BRANCH}}'\""
            ))],
        )
        .needs("lint_test")
        .with_output("image_ref"),
        JobSpec::new(
            "publish",
            steps![
                step!("sh -c \"echo scanning image\"").non_blocking(),
                step!("sh -c \"echo pushing ${BUILD_IMAGE_REF}\""),
            ],
        )
        .needs("build"),
        JobSpec::new("pr_comment", steps![step!("sh -c \"echo commenting\"")])
            .needs("publish")
            .with_condition(TriggerCondition::PullRequest)
            .always_run(),
    ];

    // CI run, triggered by a pull request.
    let scheduler = Scheduler::new(Arc::new(LocalExecutor::new()) as Arc<dyn StepExecutor>);
    let mut run = PipelineRun::new(TriggerEvent::pull_request("feature/X_1", "abc1234", 42));
    let report = scheduler.run(&mut run, specs).await?;

    let summary_spec = SummarySpec::new()
        .image_ref_from("build", "image_ref")
        .with_run_link(format!("https://ci.example/runs/{}", run.id));
    let summary = RunSummary::build(&report, &summary_spec);
    println!("CI summary: {}", serde_json::to_string_pretty(&summary)?);

    // Publish the built image so the continuation can find it.
    let store = Arc::new(InMemoryStore::new());
    let tags = TagSet::resolve(Some(run.branch()), run.commit());
    store
        .publish(&BuildArtifact::new(&repo, "sha256:demo"), &tags)
        .await?;

    // CD continuation, keyed to the CI run's completion.
    let continuation = ContinuationTrigger::new(
        Arc::new(LocalExecutor::new()) as Arc<dyn StepExecutor>,
        store,
        Arc::new(LogNotifier::new()),
        "#deployments",
        step!("sh -c \"echo pulled ${TAG}; echo '::set-output result=5'\""),
    );
    let completion = TriggerEvent::run_completed(
        run.id.to_string(),
        report.status,
        run.branch(),
        run.commit(),
        run.pr_number(),
    );
    if let Some(deployment) = continuation.on_run_completed(&completion).await? {
        println!(
            "Deployment report: {}",
            serde_json::to_string_pretty(&deployment)?
        );
    }

    Ok(())
}
