//! GitHub pull request resource

use serde_json::{Value, json};
use sluice_core::ExecutionContext;
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::resource::{
    Resource, ResourceError, ResourceHandle, Result, fetched_dir, read_trimmed, source,
};

/// Open pull requests of a GitHub repository
///
/// Unset options are left out of the emitted source so the resource's own
/// defaults apply.
#[derive(Debug, Clone, Default)]
pub struct GithubPr {
    /// `owner/repo`
    pub repository: String,
    pub access_token: String,
    pub v3_endpoint: Option<String>,
    pub v4_endpoint: Option<String>,
    pub paths: Option<Vec<String>>,
    pub ignore_paths: Option<Vec<String>>,
    pub disable_ci_skip: Option<bool>,
    pub skip_ssl_verification: Option<bool>,
    pub disable_forks: Option<bool>,
    pub ignore_drafts: Option<bool>,
    pub required_review_approvals: Option<u32>,
    pub git_crypt_key: Option<String>,
    pub base_branch: Option<String>,
    pub labels: Option<Vec<String>>,
    pub disable_git_lfs: Option<bool>,
    pub states: Option<Vec<String>>,
}

impl GithubPr {
    pub fn new(repository: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            access_token: access_token.into(),
            ..Default::default()
        }
    }
}

impl Resource for GithubPr {
    fn descriptor(&self, name: &str) -> ResourceConfig {
        ResourceConfig::new(
            name,
            "github-pr",
            Some("source-pull"),
            source(json!({
                "repository": self.repository,
                "access_token": self.access_token,
                "v3_endpoint": self.v3_endpoint,
                "v4_endpoint": self.v4_endpoint,
                "paths": self.paths,
                "ignore_paths": self.ignore_paths,
                "disable_ci_skip": self.disable_ci_skip,
                "skip_ssl_verification": self.skip_ssl_verification,
                "disable_forks": self.disable_forks,
                "ignore_drafts": self.ignore_drafts,
                "required_review_approvals": self.required_review_approvals,
                "git_crypt_key": self.git_crypt_key,
                "base_branch": self.base_branch,
                "labels": self.labels,
                "disable_git_lfs": self.disable_git_lfs,
                "states": self.states,
            })),
        )
    }

    fn resource_type(&self) -> Option<ResourceTypeConfig> {
        Some(ResourceTypeConfig::docker_image(
            "github-pr",
            "teliaoss/github-pr-resource",
            "latest",
        ))
    }

    fn acquire(&self, name: &str, context: ExecutionContext) -> ResourceHandle {
        ResourceHandle::GithubPr(GithubPrHandle::at(name, fetched_dir(name), context))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubPrHandle {
    name: String,
    path: PathBuf,
    context: ExecutionContext,
}

impl GithubPrHandle {
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

    fn resource_file(&self, file: &str) -> PathBuf {
        self.path.join(".git").join("resource").join(file)
    }

    fn read_json(&self, file: &str) -> Result<Value> {
        let path = self.resource_file(file);
        let content = read_trimmed(&path)?;
        serde_json::from_str(&content).map_err(|source| ResourceError::Parse { path, source })
    }

    /// Version object of the fetched pull request (`pr`, `commit`, ...)
    pub fn version(&self) -> Result<Option<Value>> {
        if !self.context.is_remote() {
            return Ok(None);
        }
        self.read_json("version.json").map(Some)
    }

    /// Metadata entries of the fetched pull request
    pub fn metadata(&self) -> Result<Option<Value>> {
        if !self.context.is_remote() {
            return Ok(None);
        }
        self.read_json("metadata.json").map(Some)
    }

    /// Files touched by the pull request, one per line
    pub fn changed_files(&self) -> Result<Option<Vec<String>>> {
        if !self.context.is_remote() {
            return Ok(None);
        }
        let content = read_trimmed(&self.resource_file("changed_files"))?;
        Ok(Some(
            content
                .lines()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect(),
        ))
    }
}

impl fmt::Display for GithubPrHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
