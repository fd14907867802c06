//! Error types for the Sluice engine

use sluice_core::CommandError;
use std::fmt;
use std::panic::Location;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Call site in the pipeline definition an error is attributed to
pub type CallSite = &'static Location<'static>;

/// Errors raised while building, emitting or running a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A job referenced a resource that was never registered
    #[error(
        "Resource '{name}' is not configured for the pipeline (configured: {})",
        .available.join(", ")
    )]
    ResourceNotConfigured {
        name: String,
        available: Vec<String>,
        location: CallSite,
    },

    /// A resource name was registered twice
    #[error("Resource '{name}' is already configured")]
    DuplicateResource { name: String },

    /// A job name (after normalization) was declared twice
    #[error("Job '{name}' is already declared")]
    DuplicateJob { name: String },

    /// A task name was registered twice within one job
    #[error("Task '{name}' is already declared in job '{job}'")]
    DuplicateTask {
        job: String,
        name: String,
        location: CallSite,
    },

    #[error("Job '{name}' not found. Available jobs: {}", .available.join(" "))]
    JobNotFound { name: String, available: Vec<String> },

    #[error(
        "Task '{name}' not configured inside job '{job}'. Available tasks: {}",
        .available.join(" ")
    )]
    TaskNotFound {
        job: String,
        name: String,
        available: Vec<String>,
    },

    /// A required secret resolved to nothing
    #[error("Secret '{reference}' is not available")]
    SecretUnavailable { reference: String },

    /// The secret backend itself failed (e.g. `vault` exited non-zero)
    #[error("Failed to resolve secret '{reference}': {source}")]
    SecretBackend {
        reference: String,
        #[source]
        source: CommandError,
    },

    /// A task body asked for a secret or output it never declared
    #[error("Task argument '{name}' was not declared")]
    UnknownTaskArgument { name: String },

    /// The task body returned an error; displayed exactly as the body reported it
    #[error(transparent)]
    TaskFailed(Box<TaskFailure>),

    #[error("Failed to access cache file {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache file {path} does not hold the expected value: {source}")]
    CacheFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Output or scratch directory handling failed
    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to serialize pipeline document: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

impl PipelineError {
    /// Call site in the pipeline definition, when the error has one
    pub fn location(&self) -> Option<CallSite> {
        match self {
            Self::ResourceNotConfigured { location, .. } | Self::DuplicateTask { location, .. } => {
                Some(*location)
            }
            Self::TaskFailed(failure) => Some(failure.location),
            _ => None,
        }
    }

    /// Check if this error comes from an inconsistent pipeline definition
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ResourceNotConfigured { .. }
                | Self::DuplicateResource { .. }
                | Self::DuplicateJob { .. }
                | Self::DuplicateTask { .. }
                | Self::JobNotFound { .. }
                | Self::TaskNotFound { .. }
        )
    }

    /// The error returned by a task body, if this is a task failure
    pub fn task_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::TaskFailed(failure) => Some(&failure.error),
            _ => None,
        }
    }
}

/// A task body failed
///
/// Display and source are delegated to the body's error so the message a
/// pipeline author wrote reaches the report unchanged.
#[derive(Debug)]
pub struct TaskFailure {
    pub job: String,
    pub task: String,
    /// Where the task body was defined
    pub location: CallSite,
    pub error: anyhow::Error,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for TaskFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_not_configured_lists_names() {
        let err = PipelineError::ResourceNotConfigured {
            name: "missing".to_string(),
            available: vec!["repo".to_string(), "image".to_string()],
            location: Location::caller(),
        };

        let message = err.to_string();
        assert!(message.contains("'missing'"));
        assert!(message.contains("repo, image"));
        assert!(err.location().is_some());
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_task_failure_keeps_message_and_error() {
        #[derive(Debug, Error)]
        #[error("disk full")]
        struct DiskFull;

        let err = PipelineError::TaskFailed(Box::new(TaskFailure {
            job: "build".to_string(),
            task: "compile".to_string(),
            location: Location::caller(),
            error: anyhow::Error::new(DiskFull),
        }));

        assert_eq!(err.to_string(), "disk full");
        assert!(err.task_error().unwrap().downcast_ref::<DiskFull>().is_some());
        assert!(!err.is_configuration_error());
        assert_eq!(err.location().unwrap().file(), file!());
    }

    #[test]
    fn test_task_failure_exposes_context_chain() {
        let inner = anyhow::anyhow!("connection refused").context("deploy failed");
        let err = PipelineError::TaskFailed(Box::new(TaskFailure {
            job: "deploy".to_string(),
            task: "apply".to_string(),
            location: Location::caller(),
            error: inner,
        }));

        let chain: Vec<String> = anyhow::Error::new(err)
            .chain()
            .map(|cause| cause.to_string())
            .collect();
        assert_eq!(chain, vec!["deploy failed", "connection refused"]);
    }
}
