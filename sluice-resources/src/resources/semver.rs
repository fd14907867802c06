//! Semantic version resource

use serde_json::{Map, Value, json};
use sluice_core::ExecutionContext;
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig, prune_nulls};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::resource::{Resource, ResourceHandle, Result, fetched_dir, read_trimmed, source};

/// Storage backend of a semver resource
pub trait SemVerDriver: Send + Sync {
    /// Driver-specific source keys (including `driver`)
    fn source(&self) -> Map<String, Value>;
}

/// Version counter stored in a file of a git repository
#[derive(Debug, Clone, Default)]
pub struct SemVerGitDriver {
    pub uri: String,
    pub branch: String,
    pub file: String,
    pub private_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub git_user: Option<String>,
    pub depth: Option<u32>,
    pub skip_ssl_verification: Option<bool>,
    pub commit_message: Option<String>,
}

impl SemVerGitDriver {
    pub fn new(uri: impl Into<String>, branch: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            branch: branch.into(),
            file: file.into(),
            ..Default::default()
        }
    }
}

impl SemVerDriver for SemVerGitDriver {
    fn source(&self) -> Map<String, Value> {
        prune_nulls(source(json!({
            "driver": "git",
            "uri": self.uri,
            "branch": self.branch,
            "file": self.file,
            "private_key": self.private_key,
            "username": self.username,
            "password": self.password,
            "git_user": self.git_user,
            "depth": self.depth,
            "skip_ssl_verification": self.skip_ssl_verification,
            "commit_message": self.commit_message,
        })))
    }
}

/// Version counter (built-in `semver` type)
pub struct SemVer {
    driver: Box<dyn SemVerDriver>,
    initial_version: Option<String>,
}

impl SemVer {
    pub fn new(driver: impl SemVerDriver + 'static) -> Self {
        Self {
            driver: Box::new(driver),
            initial_version: None,
        }
    }

    pub fn with_initial_version(mut self, version: impl Into<String>) -> Self {
        self.initial_version = Some(version.into());
        self
    }
}

impl Resource for SemVer {
    fn descriptor(&self, name: &str) -> ResourceConfig {
        let mut source = self.driver.source();
        if let Some(version) = &self.initial_version {
            source.insert("initial_version".to_string(), Value::String(version.clone()));
        }
        ResourceConfig::new(name, "semver", Some("creation"), source)
    }

    fn resource_type(&self) -> Option<ResourceTypeConfig> {
        None
    }

    fn acquire(&self, name: &str, context: ExecutionContext) -> ResourceHandle {
        ResourceHandle::SemVer(SemVerHandle::at(name, fetched_dir(name), context))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemVerHandle {
    name: String,
    path: PathBuf,
    context: ExecutionContext,
}

impl SemVerHandle {
    pub fn at(name: &str, path: impl Into<PathBuf>, context: ExecutionContext) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            context,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current version; `0.0.1` when running locally
    pub fn version(&self) -> Result<String> {
        if self.context.is_remote() {
            return read_trimmed(&self.path.join("version"));
        }
        Ok("0.0.1".to_string())
    }
}

impl fmt::Display for SemVerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
