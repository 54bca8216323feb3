//! Error types for Remake

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Remake operations
pub type Result<T> = std::result::Result<T, RemakeError>;

/// Main error type for Remake
#[derive(Error, Debug)]
pub enum RemakeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Variable resolution errors
    #[error("Variable error: {0}")]
    Var(#[from] VarError),

    /// Task execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Config file has no tasks")]
    NoTasks,

    #[error("Duplicate task '{0}'")]
    DuplicateTask(String),

    #[error("Duplicate variable '{0}'")]
    DuplicateVar(String),

    #[error("Invalid task name '{0}'")]
    InvalidTaskName(String),

    #[error("Invalid variable name '{0}'")]
    InvalidVarName(String),

    #[error("Task '{task}' depends on undefined task '{dependency}'")]
    UndefinedDependency { task: String, dependency: String },

    #[error("Undefined task '{0}'")]
    UndefinedTask(String),

    #[error("Default task '{0}' is not defined")]
    DefaultNotDefined(String),

    #[error("Target '{0}' is not defined")]
    UnknownTarget(String),

    #[error("Dependency cycle detected: {0}")]
    DependencyCycle(String),
}

/// Variable resolution errors (strict mode only; loose expansion never fails)
#[derive(Error, Debug)]
pub enum VarError {
    #[error("Variable cycle detected: {0}")]
    Cycle(String),

    #[error("Undefined variable '{0}'")]
    Undefined(String),

    #[error("Unable to resolve '{0}'")]
    Unresolved(String),

    #[error("Self reference without fallback in '${{{0}}}'")]
    SelfReference(String),

    #[error("Unterminated variable expression in '{0}'")]
    Unterminated(String),
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Task '{task}' failed: `{command}` exited with code {code:?}")]
    CommandFailed {
        task: String,
        command: String,
        code: Option<i32>,
    },

    #[error("Task '{task}' failed: could not start `{command}`: {source}")]
    Spawn {
        task: String,
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Task '{0}' blocked by failed dependency")]
    Blocked(String),

    #[error("Task '{task}': failed to stat {path}: {source}")]
    Stat {
        task: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Task '{task}': invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern {
        task: String,
        pattern: String,
        reason: String,
    },
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for variable resolution
pub type VarResult<T> = std::result::Result<T, VarError>;
