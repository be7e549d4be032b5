//! Error types for the pipeline domain

use thiserror::Error;

/// Errors that can occur while operating the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The job graph is malformed
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// A job specification failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The step executor failed before producing an exit code
    #[error("Executor error: {0}")]
    Executor(String),

    /// Configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Graph construction errors
///
/// All of these are fatal: they are raised before any step executes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// No jobs were supplied
    #[error("Pipeline must declare at least one job")]
    Empty,

    /// Two jobs share a name
    #[error("Duplicate job name: '{name}'")]
    DuplicateJob {
        /// The duplicated name
        name: String,
    },

    /// A job depends on a name that no job declares
    #[error("Job '{job}' depends on unknown job '{dependency}'")]
    UnknownDependency {
        /// The declaring job
        job: String,
        /// The missing dependency
        dependency: String,
    },

    /// The dependency relation contains a cycle
    #[error("Dependency cycle involving: {}", .members.join(", "))]
    Cycle {
        /// Jobs participating in the cycle
        members: Vec<String>,
    },
}

/// Validation errors for pipeline components
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name cannot be empty
    #[error("Name cannot be empty")]
    EmptyName,

    /// Name too long
    #[error("Name too long: max {max} characters, got {len}")]
    NameTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length of the name.
        len: usize,
    },

    /// Invalid characters in name
    #[error("Invalid characters in name: '{name}'")]
    InvalidNameChars {
        /// The invalid name.
        name: String,
    },

    /// Job must have at least one step
    #[error("Job '{job}' must have at least one step")]
    EmptyJob {
        /// Name of the empty job.
        job: String,
    },

    /// Step command cannot be empty
    #[error("Job '{job}' has a step with an empty command")]
    EmptyCommand {
        /// Name of the owning job.
        job: String,
    },

    /// Invalid timeout value
    #[error("Invalid timeout: must be positive")]
    InvalidTimeout,

    /// Matrix axis must declare at least one value
    #[error("Matrix axis '{axis}' must have at least one value")]
    EmptyAxis {
        /// Name of the empty axis.
        axis: String,
    },

    /// Trigger condition is malformed
    #[error("Invalid trigger condition: {0}")]
    InvalidCondition(String),
}

/// Failures of the notifier boundary
///
/// These are logged and retried at most once; they never escalate to a
/// pipeline failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifierError {
    /// The channel reference could not be understood
    #[error("Invalid channel reference: {0}")]
    Channel(String),

    /// The channel rejected the report
    #[error("Channel returned status {status}")]
    Rejected {
        /// HTTP-like status code
        status: u16,
    },

    /// The report never reached the channel
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Failures of the artifact publisher boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublisherError {
    /// The requested tag is not present in the store
    #[error("Tag not found: '{tag}'")]
    NotFound {
        /// The missing tag
        tag: String,
    },

    /// The store could not be reached
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field is absent or empty
    #[error("Missing required configuration: {field}")]
    MissingField {
        /// Name of the missing field
        field: String,
    },
}

/// A malformed value in a job output
///
/// Data-quality errors degrade a single summary field; they never fail
/// the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Field '{field}': value '{value}' is not a valid {expected}")]
pub struct DataQualityError {
    /// Summary field that could not be populated
    pub field: String,
    /// The raw value as captured from the job output
    pub value: String,
    /// What the value was expected to parse as
    pub expected: String,
}
