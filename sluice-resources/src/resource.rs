//! Resource capability
//!
//! The trait every adapter implements, the handle union jobs receive from
//! `get`/`put`, and helpers for reading directories fetched by the orchestrator.

use serde_json::{Map, Value};
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};
use sluice_core::{CommandError, ExecutionContext};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for resource handle operations
pub type Result<T> = std::result::Result<T, ResourceError>;

/// Errors raised by resource handles while reading fetched data
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A file the orchestrator places in the fetched directory could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON metadata file was malformed
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An external tool (e.g. git) failed
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Trait for pipeline resources.
///
/// A resource is an external dependency the orchestrator versions and moves
/// between jobs. Implementations describe themselves for the declarative
/// document and hand out a handle that task closures use to reach the
/// fetched data.
///
/// # Example
///
/// ```rust
/// use serde_json::{Map, Value};
/// use sluice_core::ExecutionContext;
/// use sluice_resources::{
///     DirectoryHandle, Resource, ResourceConfig, ResourceHandle, ResourceTypeConfig,
/// };
///
/// struct Bucket {
///     url: String,
/// }
///
/// impl Resource for Bucket {
///     fn descriptor(&self, name: &str) -> ResourceConfig {
///         let mut source = Map::new();
///         source.insert("url".to_string(), Value::String(self.url.clone()));
///         ResourceConfig::new(name, "bucket", Some("bucket"), source)
///     }
///
///     fn resource_type(&self) -> Option<ResourceTypeConfig> {
///         Some(ResourceTypeConfig::docker_image("bucket", "example/bucket-resource", "latest"))
///     }
///
///     fn acquire(&self, name: &str, _context: ExecutionContext) -> ResourceHandle {
///         ResourceHandle::Directory(DirectoryHandle::new(name))
///     }
/// }
///
/// let bucket = Bucket { url: "s3://artifacts".to_string() };
/// assert_eq!(bucket.descriptor("artifacts").kind, "bucket");
/// ```
pub trait Resource: Send + Sync {
    /// Returns the resource declaration emitted under `resources`.
    ///
    /// # Arguments
    /// * `name` - The name the resource is registered under in the pipeline
    fn descriptor(&self, name: &str) -> ResourceConfig;

    /// Returns the custom resource type this resource needs, if any.
    ///
    /// Types built into the orchestrator (git, registry-image, semver, ...)
    /// return `None` and are not declared under `resource_types`.
    fn resource_type(&self) -> Option<ResourceTypeConfig>;

    /// Returns the handle a job receives from `get`/`put`.
    ///
    /// # Arguments
    /// * `name` - The registered resource name (also the fetched directory name)
    /// * `context` - Local or remote execution, decides where data is looked up
    fn acquire(&self, name: &str, context: ExecutionContext) -> ResourceHandle;
}

/// Handle to a resource as seen from inside a job
///
/// Each adapter exposes its own accessors (`tag()`, `version()`, ...); the
/// engine only passes handles through, so it never depends on a concrete type.
#[derive(Debug, Clone)]
pub enum ResourceHandle {
    Git(crate::GitHandle),
    RegistryImage(crate::RegistryImageHandle),
    DockerImage(crate::DockerImageHandle),
    SemVer(crate::SemVerHandle),
    GithubRelease(crate::GithubReleaseHandle),
    GithubPr(crate::GithubPrHandle),
    /// Fetched directory without typed accessors (pool, gcs, pypi)
    Directory(DirectoryHandle),
    /// Nothing is fetched (cron triggers)
    None,
}

impl ResourceHandle {
    /// Directory holding the fetched resource, if the resource has one
    pub fn path(&self) -> Option<&Path> {
        match self {
            ResourceHandle::Git(h) => Some(h.path()),
            ResourceHandle::RegistryImage(h) => Some(h.path()),
            ResourceHandle::DockerImage(h) => Some(h.path()),
            ResourceHandle::SemVer(h) => Some(h.path()),
            ResourceHandle::GithubRelease(h) => Some(h.path()),
            ResourceHandle::GithubPr(h) => Some(h.path()),
            ResourceHandle::Directory(h) => Some(h.path()),
            ResourceHandle::None => None,
        }
    }

    pub fn as_git(&self) -> Option<&crate::GitHandle> {
        match self {
            ResourceHandle::Git(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_registry_image(&self) -> Option<&crate::RegistryImageHandle> {
        match self {
            ResourceHandle::RegistryImage(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_docker_image(&self) -> Option<&crate::DockerImageHandle> {
        match self {
            ResourceHandle::DockerImage(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_semver(&self) -> Option<&crate::SemVerHandle> {
        match self {
            ResourceHandle::SemVer(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_github_release(&self) -> Option<&crate::GithubReleaseHandle> {
        match self {
            ResourceHandle::GithubRelease(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_github_pr(&self) -> Option<&crate::GithubPrHandle> {
        match self {
            ResourceHandle::GithubPr(h) => Some(h),
            _ => None,
        }
    }
}

/// A fetched directory named after the resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryHandle {
    name: String,
    path: PathBuf,
}

impl DirectoryHandle {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: fetched_dir(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for DirectoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Absolute path of the directory the orchestrator fetches `name` into
///
/// Task containers start in their working root, where every input is a
/// directory named after the resource.
pub(crate) fn fetched_dir(name: &str) -> PathBuf {
    std::path::absolute(name).unwrap_or_else(|_| PathBuf::from(name))
}

/// Reads a one-line file written by the orchestrator into a fetched directory
pub(crate) fn read_trimmed(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Converts a `json!` object literal into a source map
pub(crate) fn source(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetched_dir_is_absolute() {
        let dir = fetched_dir("repo");
        assert!(dir.is_absolute());
        assert!(dir.ends_with("repo"));
    }

    #[test]
    fn test_read_trimmed() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("version");
        std::fs::write(&file, "1.2.3\n").unwrap();
        assert_eq!(read_trimmed(&file).unwrap(), "1.2.3");

        let missing = read_trimmed(&tmp.path().join("missing"));
        assert!(matches!(missing, Err(ResourceError::Io { .. })));
    }

    #[test]
    fn test_none_handle_has_no_path() {
        assert!(ResourceHandle::None.path().is_none());
        assert!(ResourceHandle::None.as_git().is_none());
    }

    #[test]
    fn test_directory_handle() {
        let handle = DirectoryHandle::new("lock");
        assert_eq!(handle.name(), "lock");
        assert!(handle.path().ends_with("lock"));
        assert_eq!(handle.to_string(), "lock");
    }
}
