//! Job specifications and steps
//!
//! A [`JobSpec`] is a template: name, trigger condition, ordered steps,
//! upstream dependencies, declared output keys and an optional matrix.
//! The scheduler expands it into one or more concrete instances.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::errors::ValidationError;
use super::matrix::MatrixConfig;
use super::trigger::TriggerCondition;
use super::types::Validate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

fn default_blocking() -> bool {
    true
}

/// A single command-like unit of work inside a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Command to hand to the step executor, after `${VAR}` expansion
    pub command: String,

    /// Optional name for the step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Extra environment for this step only
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub env: HashMap<String, String>,

    /// Maximum duration; expiry fails the step with a timeout reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,

    /// Whether a failure of this step fails the owning instance
    ///
    /// Non-blocking failures are recorded and execution continues
    /// (used for advisory steps such as vulnerability scans).
    #[serde(default = "default_blocking")]
    pub blocking: bool,
}

impl Step {
    /// Creates a step from a command
    pub fn run(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            name: None,
            env: HashMap::new(),
            timeout: None,
            blocking: true,
        }
    }

    /// Sets the name of the step
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an environment variable for this step only
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the timeout for the step
    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Marks this step as non-blocking
    pub fn non_blocking(mut self) -> Self {
        self.blocking = false;
        self
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "step({name}: {})", self.command),
            None => write!(f, "step({})", self.command),
        }
    }
}

/// Template for one pipeline job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Job name, unique within a pipeline
    pub name: String,

    /// Activation condition, evaluated once against the run's trigger
    #[serde(default)]
    pub condition: TriggerCondition,

    /// Ordered steps
    pub steps: Vec<Step>,

    /// Names of upstream jobs this job depends on
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub needs: Vec<String>,

    /// Output keys this job declares; only these survive to the run's
    /// output table
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub outputs: Vec<String>,

    /// Optional matrix fan-out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<MatrixConfig>,

    /// Run even when an upstream instance failed or was skipped
    ///
    /// The job still waits for upstreams to reach a terminal state.
    #[serde(default)]
    pub always_run: bool,
}

impl JobSpec {
    /// Creates a new job spec
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            condition: TriggerCondition::Always,
            steps,
            needs: Vec::new(),
            outputs: Vec::new(),
            matrix: None,
            always_run: false,
        }
    }

    /// Sets the trigger condition
    pub fn with_condition(mut self, condition: TriggerCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Declares an upstream dependency
    pub fn needs(mut self, job: impl Into<String>) -> Self {
        self.needs.push(job.into());
        self
    }

    /// Declares an output key
    pub fn with_output(mut self, key: impl Into<String>) -> Self {
        self.outputs.push(key.into());
        self
    }

    /// Sets the matrix configuration
    pub fn with_matrix(mut self, matrix: MatrixConfig) -> Self {
        self.matrix = Some(matrix);
        self
    }

    /// Marks this job to run regardless of upstream status
    pub fn always_run(mut self) -> Self {
        self.always_run = true;
        self
    }
}

impl fmt::Display for JobSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({}): {} steps", self.name, self.steps.len())
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl Validate for JobSpec {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(ValidationError::NameTooLong {
                max: 100,
                len: self.name.len(),
            });
        }

        if !valid_name(&self.name) {
            return Err(ValidationError::InvalidNameChars {
                name: self.name.clone(),
            });
        }

        if self.steps.is_empty() {
            return Err(ValidationError::EmptyJob {
                job: self.name.clone(),
            });
        }

        for step in &self.steps {
            if step.command.trim().is_empty() {
                return Err(ValidationError::EmptyCommand {
                    job: self.name.clone(),
                });
            }
            if let Some(timeout) = step.timeout
                && timeout.is_zero()
            {
                return Err(ValidationError::InvalidTimeout);
            }
        }

        for key in &self.outputs {
            if !valid_name(key) {
                return Err(ValidationError::InvalidNameChars { name: key.clone() });
            }
        }

        self.condition.validate()?;

        if let Some(ref matrix) = self.matrix {
            matrix.validate()?;
        }

        Ok(())
    }
}
