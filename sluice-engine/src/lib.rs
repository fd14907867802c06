//! Sluice Engine
//!
//! Builds pipelines from code and runs them.
//!
//! A pipeline is declared with a [`PipelineBuilder`]: resources first, then
//! jobs that get and put those resources and register tasks. The frozen
//! [`Pipeline`] can then:
//! - run every task locally, through the result cache
//! - run one task, which is what a task container does
//! - emit the declarative document for the orchestrator
//!
//! Upstream constraints (`passed`) are derived from declaration order: a job
//! that gets a resource waits for every job that touched it earlier.

pub mod cache;
pub mod chain;
pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod secrets;
pub mod step;
pub mod task;

pub use chain::ResourceChain;
pub use config::{CONTEXT_ENV, SecretSource, Settings};
pub use error::{CallSite, PipelineError, Result, TaskFailure};
pub use job::{Job, JobBuilder, ParallelBuilder};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use secrets::{
    EnvSecretManager, NamespacedSecretManager, Secret, SecretManager, StaticSecretManager,
    VaultSecretManager,
};
pub use step::{GetOptions, GetStep, Passed, PutStep, Step};
pub use task::{CachedTask, Task, TaskArgs, TaskBuilder};

pub use sluice_core::ExecutionContext;
pub use sluice_core::domain::pipeline::{Document, ImageResource};
