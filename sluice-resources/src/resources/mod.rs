//! Resource adapters
//!
//! One module per orchestrator resource type. Built-in types only describe
//! themselves; third-party types also declare the image implementing them.

pub mod cron;
pub mod docker_image;
pub mod gcs;
pub mod git;
pub mod github_pr;
pub mod github_release;
pub mod pool;
pub mod pypi;
pub mod registry_image;
pub mod semver;

pub use cron::Cron;
pub use docker_image::{DockerImage, DockerImageHandle};
pub use gcs::GoogleCloudStorage;
pub use git::{GitHandle, GitRepo};
pub use github_pr::{GithubPr, GithubPrHandle};
pub use github_release::{GithubRelease, GithubReleaseHandle};
pub use pool::Pool;
pub use pypi::PyPi;
pub use registry_image::{RegistryImage, RegistryImageHandle};
pub use semver::{SemVer, SemVerDriver, SemVerGitDriver, SemVerHandle};
