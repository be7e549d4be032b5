//! Job scheduling and execution
//!
//! The scheduler owns all job instances for the duration of one run.
//! Instances whose upstreams are terminal become eligible; eligible
//! instances run concurrently over a bounded pool of worker slots,
//! each driving its steps sequentially. The run-level status/output
//! tables are the only shared mutable state and sit behind a single
//! mutex.

use crate::engine::graph::JobGraph;
use crate::engine::traits::{StepExecutor, WorkingEnv};
use crate::pipeline::{
    EngineError, Environment, FailureReason, InstanceReport, JobSpec, JobStatus, PipelineRun,
    RunReport, RunStatus, Step, env_key,
};
use ahash::AHashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Cooperative cancellation signal for a run
///
/// Pending instances skip; in-flight instances stop at the next step
/// boundary. Steps already running are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run-level shared state: the single critical section
struct RunState {
    statuses: Vec<JobStatus>,
    failures: Vec<Option<FailureReason>>,
    durations: Vec<Option<Duration>>,
    /// Append-only output table keyed by (instance, key), written once
    /// at instance termination
    outputs: AHashMap<(usize, String), String>,
}

impl RunState {
    fn new(graph: &JobGraph) -> Self {
        let statuses = graph
            .instances()
            .iter()
            .map(|instance| {
                if instance.deps.is_empty() {
                    JobStatus::Pending
                } else {
                    JobStatus::Blocked
                }
            })
            .collect::<Vec<_>>();
        let count = statuses.len();
        Self {
            statuses,
            failures: vec![None; count],
            durations: vec![None; count],
            outputs: AHashMap::new(),
        }
    }

    fn deps_terminal(&self, deps: &[usize]) -> bool {
        deps.iter().all(|&dep| self.statuses[dep].is_terminal())
    }

    fn deps_succeeded(&self, deps: &[usize]) -> bool {
        deps.iter().all(|&dep| self.statuses[dep].is_succeeded())
    }

    fn set_skipped(&mut self, index: usize) {
        self.statuses[index] = JobStatus::Skipped;
    }

    fn commit(&mut self, index: usize, outcome: InstanceOutcome) {
        self.statuses[index] = outcome.status;
        self.failures[index] = outcome.failure;
        self.durations[index] = Some(outcome.duration);
        for (key, value) in outcome.outputs {
            self.outputs.insert((index, key), value);
        }
    }

    fn outputs_of(&self, index: usize) -> BTreeMap<String, String> {
        self.outputs
            .iter()
            .filter(|((owner, _), _)| *owner == index)
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Terminal result of one instance execution
struct InstanceOutcome {
    status: JobStatus,
    failure: Option<FailureReason>,
    outputs: HashMap<String, String>,
    duration: Duration,
}

/// Everything an instance future needs, owned
struct InstanceWork {
    index: usize,
    id: String,
    steps: Vec<Step>,
    declared: Vec<String>,
    env: Environment,
}

type InstanceFuture = Pin<Box<dyn Future<Output = (usize, InstanceOutcome)> + Send>>;

/// Dependency-respecting pipeline scheduler
pub struct Scheduler {
    executor: Arc<dyn StepExecutor>,
    pool_size: usize,
    cancel: CancelFlag,
}

impl Scheduler {
    /// Creates a scheduler backed by the given step executor.
    ///
    /// The worker pool defaults to the host's available parallelism.
    #[must_use]
    pub fn new(executor: Arc<dyn StepExecutor>) -> Self {
        let pool_size = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(4);
        Self {
            executor,
            pool_size,
            cancel: CancelFlag::new(),
        }
    }

    /// Overrides the worker pool size
    #[must_use]
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }

    /// Returns a handle that cancels this scheduler's runs
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Builds the job graph and executes the run.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`][crate::pipeline::GraphError] (wrapped
    /// in [`EngineError`]) before any step executes when the specs are
    /// malformed or cyclic. Step failures do not surface here; they
    /// are folded into the [`RunReport`].
    pub async fn run(
        &self,
        run: &mut PipelineRun,
        specs: Vec<JobSpec>,
    ) -> Result<RunReport, EngineError> {
        let graph = JobGraph::build(specs)?;
        self.run_graph(run, &graph).await
    }

    /// Executes a pre-built job graph.
    ///
    /// # Errors
    ///
    /// Infallible in practice once the graph is built; the signature
    /// matches [`run`][Self::run] for callers that pre-validate.
    pub async fn run_graph(
        &self,
        run: &mut PipelineRun,
        graph: &JobGraph,
    ) -> Result<RunReport, EngineError> {
        run.start();
        tracing::info!(
            run_id = %run.id,
            instances = graph.instances().len(),
            pool = self.pool_size,
            "Starting pipeline run"
        );

        let count = graph.instances().len();
        let state = Arc::new(Mutex::new(RunState::new(graph)));
        let semaphore = Arc::new(Semaphore::new(self.pool_size));
        let mut launched = vec![false; count];
        let mut in_flight: FuturesUnordered<InstanceFuture> = FuturesUnordered::new();

        loop {
            // Launch everything newly eligible. Skipping an instance
            // makes it terminal, which may unblock further instances,
            // so loop to a fixpoint.
            let mut progressed = true;
            while progressed {
                progressed = false;
                for index in 0..count {
                    if launched[index] {
                        continue;
                    }
                    let deps = graph.instances()[index].deps.as_slice();
                    let (deps_terminal, deps_ok) = {
                        let st = state.lock();
                        (st.deps_terminal(deps), st.deps_succeeded(deps))
                    };
                    if !deps_terminal {
                        continue;
                    }
                    launched[index] = true;
                    progressed = true;

                    let spec = graph.spec_of(index);
                    let id = graph.instances()[index].id.clone();

                    if self.cancel.is_cancelled() {
                        tracing::info!(instance = %id, "Run cancelled, skipping instance");
                        state.lock().set_skipped(index);
                        continue;
                    }
                    if !spec.condition.evaluate(&run.event) {
                        tracing::debug!(instance = %id, "Trigger condition false, skipping");
                        state.lock().set_skipped(index);
                        continue;
                    }
                    if !deps_ok && !spec.always_run {
                        tracing::info!(instance = %id, "Upstream did not succeed, skipping");
                        state.lock().set_skipped(index);
                        continue;
                    }

                    let work = InstanceWork {
                        index,
                        id,
                        steps: spec.steps.clone(),
                        declared: spec.outputs.clone(),
                        env: instance_env(run, graph, index, &state.lock()),
                    };
                    in_flight.push(Box::pin(run_instance(
                        Arc::clone(&self.executor),
                        Arc::clone(&semaphore),
                        self.cancel.clone(),
                        Arc::clone(&state),
                        work,
                    )));
                }
            }

            match in_flight.next().await {
                Some((index, outcome)) => {
                    tracing::info!(
                        instance = %graph.instances()[index].id,
                        status = %outcome.status,
                        "Instance terminal"
                    );
                    state.lock().commit(index, outcome);
                }
                None => break,
            }
        }

        let report = build_report(run, graph, &state.lock(), self.cancel.is_cancelled());
        run.finish(report.status);
        tracing::info!(run_id = %run.id, status = %report.status, "Pipeline run terminal");
        Ok(report)
    }
}

/// Builds the environment an instance's steps see: run facts, axis
/// values, and upstream outputs as `<JOB>_<KEY>` variables.
fn instance_env(
    run: &PipelineRun,
    graph: &JobGraph,
    index: usize,
    state: &RunState,
) -> Environment {
    let mut env = Environment::new()
        .set("RUN_ID", run.id.to_string())
        .set("BRANCH", run.branch())
        .set("COMMIT", run.commit());
    if let Some(pr) = run.pr_number() {
        env.insert("PR_NUMBER", pr.to_string());
    }

    let instance = &graph.instances()[index];
    for (axis, value) in &instance.axes {
        env.insert(env_key(axis), value.clone());
    }

    for &dep in &instance.deps {
        let prefix = env_key(&graph.instances()[dep].id);
        for (key, value) in state.outputs_of(dep) {
            env.insert(format!("{prefix}_{}", env_key(&key)), value);
        }
    }

    env
}

async fn run_instance(
    executor: Arc<dyn StepExecutor>,
    semaphore: Arc<Semaphore>,
    cancel: CancelFlag,
    state: Arc<Mutex<RunState>>,
    work: InstanceWork,
) -> (usize, InstanceOutcome) {
    let Ok(_permit) = Arc::clone(&semaphore).acquire_owned().await else {
        // Pool torn down; treat as never started.
        return (
            work.index,
            InstanceOutcome {
                status: JobStatus::Skipped,
                failure: None,
                outputs: HashMap::new(),
                duration: Duration::ZERO,
            },
        );
    };

    state.lock().statuses[work.index] = JobStatus::Running;
    tracing::info!(instance = %work.id, steps = work.steps.len(), "Instance running");

    let start = Instant::now();
    let mut captured: HashMap<String, String> = HashMap::new();
    let mut failure: Option<FailureReason> = None;

    for (step_index, step) in work.steps.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!(instance = %work.id, "Cancelled at step boundary");
            failure = Some(FailureReason::Cancelled);
            break;
        }

        let mut env = work.env.clone();
        for (key, value) in &step.env {
            let resolved = work.env.resolve(value);
            env.insert(key.clone(), resolved);
        }
        let command = env.resolve(&step.command);
        let label = step
            .name
            .clone()
            .unwrap_or_else(|| format!("step-{}", step_index + 1));
        tracing::debug!(instance = %work.id, step = %label, command = %command, "Executing step");

        let working_env = WorkingEnv::new(env);
        let result = match step.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, executor.execute(&command, &working_env)).await {
                    Ok(result) => result,
                    Err(_) => {
                        if step.blocking {
                            tracing::error!(
                                instance = %work.id,
                                step = %label,
                                limit_ms = limit.as_millis(),
                                "Step timed out"
                            );
                            failure = Some(FailureReason::Timeout { limit });
                            break;
                        }
                        tracing::warn!(instance = %work.id, step = %label, "Non-blocking step timed out");
                        continue;
                    }
                }
            }
            None => executor.execute(&command, &working_env).await,
        };

        match result {
            Ok(step_result) => {
                let exit_code = step_result.exit_code;
                captured.extend(step_result.outputs);
                if exit_code != 0 {
                    if step.blocking {
                        tracing::error!(
                            instance = %work.id,
                            step = %label,
                            code = exit_code,
                            "Blocking step failed"
                        );
                        failure = Some(FailureReason::ExitCode { code: exit_code });
                        break;
                    }
                    tracing::warn!(
                        instance = %work.id,
                        step = %label,
                        code = exit_code,
                        "Non-blocking step failed, continuing"
                    );
                }
            }
            Err(err) => {
                if step.blocking {
                    tracing::error!(instance = %work.id, step = %label, error = %err, "Executor error");
                    failure = Some(FailureReason::Error {
                        message: err.to_string(),
                    });
                    break;
                }
                tracing::warn!(instance = %work.id, step = %label, error = %err, "Non-blocking executor error, continuing");
            }
        }
    }

    // Only declared keys survive to the run-level table.
    let mut outputs = HashMap::new();
    for key in &work.declared {
        if let Some(value) = captured.remove(key) {
            outputs.insert(key.clone(), value);
        }
    }
    for dropped in captured.keys() {
        tracing::debug!(instance = %work.id, key = %dropped, "Dropping undeclared output");
    }

    let status = if failure.is_some() {
        JobStatus::Failed
    } else {
        JobStatus::Succeeded
    };
    (
        work.index,
        InstanceOutcome {
            status,
            failure,
            outputs,
            duration: start.elapsed(),
        },
    )
}

fn build_report(
    run: &PipelineRun,
    graph: &JobGraph,
    state: &RunState,
    cancelled: bool,
) -> RunReport {
    let instances = graph
        .instances()
        .iter()
        .enumerate()
        .map(|(index, instance)| InstanceReport {
            id: instance.id.clone(),
            spec: graph.spec_of(index).name.clone(),
            axes: instance.axes.clone(),
            status: state.statuses[index],
            failure: state.failures[index].clone(),
            outputs: state.outputs_of(index),
            duration: state.durations[index],
        })
        .collect::<Vec<_>>();

    let any_failed = instances.iter().any(|i| i.status.is_failed());
    let status = if any_failed || cancelled {
        RunStatus::Failed
    } else {
        RunStatus::Succeeded
    };

    RunReport {
        run_id: run.id,
        status,
        instances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::traits::StepResult;
    use crate::pipeline::{MatrixConfig, TriggerCondition, TriggerEvent};
    use async_trait::async_trait;

    struct Rule {
        prefix: String,
        exit_code: i32,
        outputs: Vec<(String, String)>,
        delay: Option<Duration>,
    }

    /// Scripted executor: rules match on command prefix, first wins.
    #[derive(Default)]
    struct MockExecutor {
        rules: Vec<Rule>,
        calls: Mutex<Vec<String>>,
    }

    impl MockExecutor {
        fn new() -> Self {
            Self::default()
        }

        fn fail_on(mut self, prefix: &str, exit_code: i32) -> Self {
            self.rules.push(Rule {
                prefix: prefix.to_string(),
                exit_code,
                outputs: vec![],
                delay: None,
            });
            self
        }

        fn output_on(mut self, prefix: &str, key: &str, value: &str) -> Self {
            self.rules.push(Rule {
                prefix: prefix.to_string(),
                exit_code: 0,
                outputs: vec![(key.to_string(), value.to_string())],
                delay: None,
            });
            self
        }

        fn delay_on(mut self, prefix: &str, delay: Duration) -> Self {
            self.rules.push(Rule {
                prefix: prefix.to_string(),
                exit_code: 0,
                outputs: vec![],
                delay: Some(delay),
            });
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl StepExecutor for MockExecutor {
        async fn execute(
            &self,
            command: &str,
            _env: &WorkingEnv,
        ) -> Result<StepResult, EngineError> {
            self.calls.lock().push(command.to_string());
            let rule = self.rules.iter().find(|r| command.starts_with(&r.prefix));
            if let Some(rule) = rule {
                if let Some(delay) = rule.delay {
                    tokio::time::sleep(delay).await;
                }
                return Ok(StepResult {
                    exit_code: rule.exit_code,
                    stdout_tail: vec![],
                    outputs: rule.outputs.iter().cloned().collect(),
                    duration: Duration::ZERO,
                });
            }
            Ok(StepResult {
                exit_code: 0,
                stdout_tail: vec![],
                outputs: HashMap::new(),
                duration: Duration::ZERO,
            })
        }
    }

    fn push_run() -> PipelineRun {
        PipelineRun::new(TriggerEvent::push("main", "abc1234"))
    }

    fn job(name: &str, command: &str) -> JobSpec {
        JobSpec::new(name, vec![Step::run(command)])
    }

    #[tokio::test]
    async fn test_cycle_detected_before_any_execution() {
        let executor = Arc::new(MockExecutor::new());
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        let mut run = push_run();

        let specs = vec![
            job("a", "echo a").needs("b"),
            job("b", "echo b").needs("a"),
        ];
        let err = scheduler.run(&mut run, specs).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::Graph(crate::pipeline::GraphError::Cycle { .. })
        ));
        assert!(executor.calls().is_empty(), "no step may execute");
    }

    #[tokio::test]
    async fn test_linear_chain_propagates_outputs() {
        let executor = Arc::new(
            MockExecutor::new().output_on("make image", "image_ref", "user/app:main"),
        );
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        let mut run = push_run();

        let specs = vec![
            job("build", "make image").with_output("image_ref"),
            job("deploy", "deploy ${BUILD_IMAGE_REF}").needs("build"),
        ];
        let report = scheduler.run(&mut run, specs).await.unwrap();

        assert_eq!(report.status, RunStatus::Succeeded);
        assert_eq!(report.output("build", "image_ref"), Some("user/app:main"));
        assert!(executor.calls().contains(&"deploy user/app:main".to_string()));
    }

    #[tokio::test]
    async fn test_matrix_leg_failure_is_independent() {
        let executor = Arc::new(MockExecutor::new().fail_on("pytest 3.11", 1));
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        let mut run = push_run();

        let matrix = MatrixConfig::new().add_axis(
            "python",
            vec!["3.10".to_string(), "3.11".to_string(), "3.12".to_string()],
        );
        let specs = vec![job("lint_test", "pytest ${PYTHON}").with_matrix(matrix)];
        let report = scheduler.run(&mut run, specs).await.unwrap();

        assert_eq!(report.instances.len(), 3);
        let statuses: Vec<JobStatus> = report.instances.iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![JobStatus::Succeeded, JobStatus::Failed, JobStatus::Succeeded]
        );
        assert_eq!(report.status, RunStatus::Failed);
        // All three legs actually ran.
        assert_eq!(executor.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_upstream_failure_cascades_as_skipped() {
        let executor = Arc::new(MockExecutor::new().fail_on("make lint", 2));
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        let mut run = push_run();

        let specs = vec![
            job("lint", "make lint"),
            job("build", "make image").needs("lint"),
            job("publish", "push image").needs("build"),
        ];
        let report = scheduler.run(&mut run, specs).await.unwrap();

        assert_eq!(report.instance("lint").unwrap().status, JobStatus::Failed);
        assert_eq!(
            report.instance("lint").unwrap().failure,
            Some(FailureReason::ExitCode { code: 2 })
        );
        assert_eq!(report.instance("build").unwrap().status, JobStatus::Skipped);
        assert_eq!(
            report.instance("publish").unwrap().status,
            JobStatus::Skipped
        );
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_always_run_job_executes_after_upstream_failure() {
        let executor = Arc::new(MockExecutor::new().fail_on("coverage", 1));
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        let mut run = PipelineRun::new(TriggerEvent::pull_request("feature/x", "abc1234", 7));

        let specs = vec![
            job("coverage", "coverage run").with_output("percent"),
            job("pr_comment", "post comment").needs("coverage").always_run(),
        ];
        let report = scheduler.run(&mut run, specs).await.unwrap();

        assert_eq!(
            report.instance("pr_comment").unwrap().status,
            JobStatus::Succeeded
        );

        // The summary built over this report marks coverage unavailable.
        let spec = crate::pipeline::SummarySpec::new().coverage_from("coverage", "percent");
        let summary = crate::pipeline::RunSummary::build(&report, &spec);
        assert!(!summary.coverage_percent().is_available());
    }

    #[tokio::test]
    async fn test_non_blocking_step_failure_keeps_instance_green() {
        let executor = Arc::new(MockExecutor::new().fail_on("scan image", 3));
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        let mut run = push_run();

        let specs = vec![JobSpec::new(
            "publish",
            vec![
                Step::run("scan image").non_blocking(),
                Step::run("push image"),
            ],
        )];
        let report = scheduler.run(&mut run, specs).await.unwrap();

        assert_eq!(report.instance("publish").unwrap().status, JobStatus::Succeeded);
        assert_eq!(report.status, RunStatus::Succeeded);
        assert_eq!(executor.calls().len(), 2, "second step still runs");
    }

    #[tokio::test]
    async fn test_step_timeout_reports_distinct_reason() {
        let executor = Arc::new(MockExecutor::new().delay_on("slow", Duration::from_secs(5)));
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        let mut run = push_run();

        let specs = vec![JobSpec::new(
            "stuck",
            vec![Step::run("slow step").with_timeout(Duration::from_millis(50))],
        )];
        let report = scheduler.run(&mut run, specs).await.unwrap();

        let instance = report.instance("stuck").unwrap();
        assert_eq!(instance.status, JobStatus::Failed);
        assert!(matches!(
            instance.failure,
            Some(FailureReason::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_trigger_condition_false_skips_without_failing_run() {
        let executor = Arc::new(MockExecutor::new());
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        let mut run = push_run();

        let specs = vec![
            job("lint", "make lint"),
            job("pr_comment", "post comment")
                .with_condition(TriggerCondition::PullRequest),
        ];
        let report = scheduler.run(&mut run, specs).await.unwrap();

        assert_eq!(
            report.instance("pr_comment").unwrap().status,
            JobStatus::Skipped
        );
        assert_eq!(report.status, RunStatus::Succeeded);
        assert_eq!(executor.calls(), vec!["make lint".to_string()]);
    }

    #[tokio::test]
    async fn test_cancelled_run_skips_everything_and_fails() {
        let executor = Arc::new(MockExecutor::new());
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        scheduler.cancel_flag().cancel();
        let mut run = push_run();

        let specs = vec![job("lint", "make lint"), job("build", "make image")];
        let report = scheduler.run(&mut run, specs).await.unwrap();

        assert!(report.instances.iter().all(|i| i.status.is_skipped()));
        assert_eq!(report.status, RunStatus::Failed);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_only_declared_outputs_survive() {
        let executor = Arc::new(MockExecutor {
            rules: vec![Rule {
                prefix: "emit".to_string(),
                exit_code: 0,
                outputs: vec![
                    ("declared".to_string(), "yes".to_string()),
                    ("undeclared".to_string(), "no".to_string()),
                ],
                delay: None,
            }],
            calls: Mutex::new(vec![]),
        });
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        let mut run = push_run();

        let specs = vec![job("emitter", "emit outputs").with_output("declared")];
        let report = scheduler.run(&mut run, specs).await.unwrap();

        let outputs = &report.instance("emitter").unwrap().outputs;
        assert_eq!(outputs.get("declared").map(String::as_str), Some("yes"));
        assert!(!outputs.contains_key("undeclared"));
    }

    #[tokio::test]
    async fn test_failed_instance_outputs_still_committed() {
        let executor = Arc::new(MockExecutor {
            rules: vec![
                Rule {
                    prefix: "emit".to_string(),
                    exit_code: 0,
                    outputs: vec![("partial".to_string(), "kept".to_string())],
                    delay: None,
                },
                Rule {
                    prefix: "boom".to_string(),
                    exit_code: 1,
                    outputs: vec![],
                    delay: None,
                },
            ],
            calls: Mutex::new(vec![]),
        });
        let scheduler = Scheduler::new(Arc::clone(&executor) as Arc<dyn StepExecutor>);
        let mut run = push_run();

        let specs = vec![
            JobSpec::new("flaky", vec![Step::run("emit"), Step::run("boom")])
                .with_output("partial"),
        ];
        let report = scheduler.run(&mut run, specs).await.unwrap();

        let instance = report.instance("flaky").unwrap();
        assert_eq!(instance.status, JobStatus::Failed);
        assert_eq!(instance.outputs.get("partial").map(String::as_str), Some("kept"));
    }
}
