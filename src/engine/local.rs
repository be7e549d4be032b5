//! Local step executor
//!
//! Runs step commands as host processes. Commands are argv-style: the
//! string is split with shell quoting rules and spawned directly, no
//! shell interpolation. Steps emit structured outputs by printing
//! `::set-output key=value` lines on stdout.

use crate::engine::traits::{StepExecutor, StepResult, WorkingEnv};
use crate::pipeline::EngineError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

static OUTPUT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^::set-output\s+([A-Za-z_][A-Za-z0-9_-]*)=(.*)$").unwrap());

/// Default number of stdout lines kept in the tail
pub const DEFAULT_TAIL_LIMIT: usize = 20;

/// Step executor that spawns host processes
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    cwd: Option<PathBuf>,
    base_env: HashMap<String, String>,
    tail_limit: usize,
}

impl LocalExecutor {
    /// Creates a local executor with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            cwd: None,
            base_env: HashMap::new(),
            tail_limit: DEFAULT_TAIL_LIMIT,
        }
    }

    /// Sets the working directory for spawned processes
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Adds a base environment variable for every spawned process
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.base_env.insert(key.into(), value.into());
        self
    }

    /// Overrides how many stdout lines the tail keeps
    #[must_use]
    pub fn with_tail_limit(mut self, limit: usize) -> Self {
        self.tail_limit = limit;
        self
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepExecutor for LocalExecutor {
    async fn execute(&self, command: &str, env: &WorkingEnv) -> Result<StepResult, EngineError> {
        let argv = shell_words::split(command)
            .map_err(|e| EngineError::Executor(format!("cannot parse command: {e}")))?;
        let Some((program, args)) = argv.split_first() else {
            return Err(EngineError::Executor("empty command".to_string()));
        };

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args);
        cmd.envs(&self.base_env);
        cmd.envs(&env.env.vars);
        if let Some(cwd) = env.cwd.as_ref().or(self.cwd.as_ref()) {
            cmd.current_dir(cwd);
        }
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        let start = Instant::now();
        tracing::debug!(command = %command, "Spawning step process");

        let output = cmd
            .output()
            .await
            .map_err(|e| EngineError::Executor(format!("failed to spawn '{program}': {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (outputs, tail) = parse_stdout(&stdout, self.tail_limit);
        let exit_code = output.status.code().unwrap_or(-1);

        if exit_code != 0 {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(command = %command, code = exit_code, stderr = %stderr, "Step process failed");
        }

        Ok(StepResult {
            exit_code,
            stdout_tail: tail,
            outputs,
            duration: start.elapsed(),
        })
    }
}

/// Splits stdout into structured outputs and a bounded tail of the
/// remaining lines.
fn parse_stdout(stdout: &str, tail_limit: usize) -> (HashMap<String, String>, Vec<String>) {
    let mut outputs = HashMap::new();
    let mut tail: Vec<String> = Vec::new();

    for line in stdout.lines() {
        if let Some(caps) = OUTPUT_LINE.captures(line) {
            outputs.insert(caps[1].to_string(), caps[2].to_string());
        } else {
            tail.push(line.to_string());
        }
    }

    if tail.len() > tail_limit {
        tail.drain(..tail.len() - tail_limit);
    }

    (outputs, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Environment;

    fn env() -> WorkingEnv {
        WorkingEnv::new(Environment::new())
    }

    #[tokio::test]
    async fn test_successful_command() {
        let executor = LocalExecutor::new();
        let result = executor.execute("echo hello", &env()).await.unwrap();

        assert_eq!(result.exit_code, 0);
        assert!(result.is_success());
        assert_eq!(result.stdout_tail, vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_command() {
        let executor = LocalExecutor::new();
        let result = executor.execute("false", &env()).await.unwrap();

        assert_ne!(result.exit_code, 0);
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_missing_program_is_executor_error() {
        let executor = LocalExecutor::new();
        let err = executor
            .execute("definitely-not-a-real-program-xyz", &env())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Executor(_)));
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let executor = LocalExecutor::new();
        let err = executor.execute("   ", &env()).await.unwrap_err();
        assert!(matches!(err, EngineError::Executor(_)));
    }

    #[tokio::test]
    async fn test_structured_outputs_parsed() {
        let executor = LocalExecutor::new();
        let result = executor
            .execute(r#"sh -c "echo '::set-output coverage=93.5'; echo done""#, &env())
            .await
            .unwrap();

        assert_eq!(
            result.outputs.get("coverage").map(String::as_str),
            Some("93.5")
        );
        // Output lines do not pollute the tail.
        assert_eq!(result.stdout_tail, vec!["done".to_string()]);
    }

    #[tokio::test]
    async fn test_step_env_reaches_process() {
        let executor = LocalExecutor::new();
        let working = WorkingEnv::new(Environment::new().set("GREETING", "hi"));
        let result = executor
            .execute(r#"sh -c "echo $GREETING""#, &working)
            .await
            .unwrap();

        assert_eq!(result.stdout_tail, vec!["hi".to_string()]);
    }

    #[tokio::test]
    async fn test_cwd_override() {
        let dir = tempfile::tempdir().unwrap();
        let executor = LocalExecutor::new().with_cwd(dir.path());
        let result = executor.execute("pwd", &env()).await.unwrap();

        let reported = result.stdout_tail.last().unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(
            PathBuf::from(reported).canonicalize().unwrap(),
            canonical
        );
    }

    #[test]
    fn test_parse_stdout_tail_is_bounded() {
        let stdout = (0..30).map(|i| format!("line {i}\n")).collect::<String>();
        let (outputs, tail) = parse_stdout(&stdout, 5);

        assert!(outputs.is_empty());
        assert_eq!(tail.len(), 5);
        assert_eq!(tail.last().map(String::as_str), Some("line 29"));
    }
}
