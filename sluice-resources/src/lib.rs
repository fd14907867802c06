//! Sluice Resources
//!
//! External dependencies a pipeline reads from or writes to: repositories,
//! image registries, version counters, lock pools, timers.
//! It includes:
//! - The `Resource` capability trait every adapter implements
//! - `ResourceHandle`, the value a job receives when it gets or puts a resource
//! - Concrete adapters for the common orchestrator resource types

pub mod resource;
pub mod resources;

pub use resource::{DirectoryHandle, Resource, ResourceError, ResourceHandle, Result};
pub use resources::{
    Cron, DockerImage, DockerImageHandle, GitHandle, GitRepo, GithubPr, GithubPrHandle,
    GithubRelease, GithubReleaseHandle, GoogleCloudStorage, Pool, PyPi, RegistryImage,
    RegistryImageHandle, SemVer, SemVerDriver, SemVerGitDriver, SemVerHandle,
};

pub use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};
