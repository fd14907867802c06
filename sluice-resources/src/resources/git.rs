//! Git repository resource

use serde_json::{Value, json};
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};
use sluice_core::{ExecutionContext, capture};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::resource::{Resource, ResourceHandle, Result, fetched_dir, read_trimmed, source};

const DEFAULT_USER_NAME: &str = "unknown";
const DEFAULT_USER_EMAIL: &str = "unknown@nowhere";

/// A git repository tracked by the built-in `git` resource type
#[derive(Debug, Clone, Default)]
pub struct GitRepo {
    pub uri: String,
    pub branch: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub private_key: Option<String>,
    pub paths: Option<Vec<String>>,
    pub ignore_paths: Option<Vec<String>>,
    pub tag_filter: Option<String>,
    pub fetch_tags: Option<bool>,
    /// `git config` entries applied by the resource, in declaration order
    pub git_config: Vec<(String, String)>,
}

impl GitRepo {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_git_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.git_config.push((key.into(), value.into()));
        self
    }
}

impl Resource for GitRepo {
    fn descriptor(&self, name: &str) -> ResourceConfig {
        let git_config = if self.git_config.is_empty() {
            Value::Null
        } else {
            Value::Array(
                self.git_config
                    .iter()
                    .map(|(k, v)| json!({"name": k, "value": v}))
                    .collect(),
            )
        };

        ResourceConfig::new(
            name,
            "git",
            Some("git"),
            source(json!({
                "uri": self.uri,
                "branch": self.branch,
                "username": self.username,
                "password": self.password,
                "paths": self.paths,
                "ignore_paths": self.ignore_paths,
                "tag_filter": self.tag_filter,
                "git_config": git_config,
                "private_key": self.private_key,
                "fetch_tags": self.fetch_tags,
            })),
        )
    }

    fn resource_type(&self) -> Option<ResourceTypeConfig> {
        None
    }

    fn acquire(&self, name: &str, context: ExecutionContext) -> ResourceHandle {
        ResourceHandle::Git(
            GitHandle::new(name, &self.uri, context).with_config(self.git_config.clone()),
        )
    }
}

/// Checked-out repository
///
/// Remotely the orchestrator fetches the repository into a directory named
/// after the resource. Locally the developer's checkout under
/// `$HOME/workspace/<repo>` is used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHandle {
    name: String,
    path: PathBuf,
    context: ExecutionContext,
    config: Vec<(String, String)>,
}

impl GitHandle {
    pub fn new(name: &str, uri: &str, context: ExecutionContext) -> Self {
        let path = if context.is_remote() {
            fetched_dir(name)
        } else {
            local_checkout(uri)
        };
        Self::at(name, path, context)
    }

    /// Handle for a checkout at an explicit path
    pub fn at(name: &str, path: impl Into<PathBuf>, context: ExecutionContext) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            context,
            config: Vec::new(),
        }
    }

    /// `git config` entries of the repository declaration
    pub fn with_config(mut self, config: Vec<(String, String)>) -> Self {
        self.config = config;
        self
    }

    /// Last configured value of a `git config` key
    pub fn config(&self, key: &str) -> Option<&str> {
        self.config
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Author name and email for commits made on a copy of this checkout
    pub fn commit_identity(&self) -> (&str, &str) {
        (
            self.config("user.name").unwrap_or(DEFAULT_USER_NAME),
            self.config("user.email").unwrap_or(DEFAULT_USER_EMAIL),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Newest tag describing the checked-out commit
    pub fn tag(&self) -> Result<String> {
        Ok(capture("git", &["describe", "--tags"], Some(&self.path))?)
    }

    /// One stable reference for the checked-out version
    ///
    /// Remotely this is the ref the git resource recorded; locally the tag if
    /// there is one, otherwise the full commit hash.
    pub fn reference(&self) -> Result<String> {
        if self.context.is_remote() {
            return read_trimmed(&self.path.join(".git").join("ref"));
        }
        match self.tag() {
            Ok(tag) => Ok(tag),
            Err(e) => {
                debug!("No tag for {}, falling back to HEAD: {}", self.name, e);
                Ok(capture("git", &["rev-parse", "HEAD"], Some(&self.path))?)
            }
        }
    }

    pub fn short_ref(&self) -> Result<String> {
        if self.context.is_remote() {
            return read_trimmed(&self.path.join(".git").join("short_ref"));
        }
        Ok(capture("git", &["rev-parse", "--short", "HEAD"], Some(&self.path))?)
    }
}

impl fmt::Display for GitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

fn local_checkout(uri: &str) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_default();
    let repo = Path::new(uri)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    PathBuf::from(home).join("workspace").join(repo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor() {
        let repo = GitRepo::new("https://example.com/repo.git")
            .with_git_config("user.name", "unknown")
            .with_git_config("user.email", "unknown@example.com");

        let config = repo.descriptor("test");
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "name": "test",
                "type": "git",
                "icon": "git",
                "source": {
                    "uri": "https://example.com/repo.git",
                    "git_config": [
                        {"name": "user.name", "value": "unknown"},
                        {"name": "user.email", "value": "unknown@example.com"},
                    ],
                },
            })
        );
        assert!(repo.resource_type().is_none());
    }

    #[test]
    fn test_handle_carries_git_config() {
        let repo = GitRepo::new("https://example.com/repo.git")
            .with_git_config("user.name", "ci-bot")
            .with_git_config("user.email", "ci@example.com")
            .with_git_config("user.name", "release-bot");

        let handle = repo.acquire("source", ExecutionContext::Remote);
        let git = handle.as_git().unwrap();
        assert_eq!(git.config("user.email"), Some("ci@example.com"));
        assert_eq!(git.commit_identity(), ("release-bot", "ci@example.com"));
        assert_eq!(git.config("core.autocrlf"), None);
    }

    #[test]
    fn test_commit_identity_defaults() {
        let handle = GitHandle::at("source", "/tmp/source", ExecutionContext::Local);
        assert_eq!(handle.commit_identity(), ("unknown", "unknown@nowhere"));
    }

    #[test]
    fn test_local_path_uses_workspace_checkout() {
        let repo = GitRepo::new("https://example.com/repo.git");
        let handle = repo.acquire("xxx", ExecutionContext::Local);
        let git = handle.as_git().unwrap();
        assert!(git.path().ends_with("workspace/repo"));
    }

    #[test]
    fn test_remote_path_is_fetched_dir() {
        let repo = GitRepo::new("https://example.com/repo.git");
        let handle = repo.acquire("source", ExecutionContext::Remote);
        let git = handle.as_git().unwrap();
        assert!(git.path().is_absolute());
        assert!(git.path().ends_with("source"));
    }

    #[test]
    fn test_remote_refs_read_from_git_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
        std::fs::write(tmp.path().join(".git/ref"), "v1.0.0\n").unwrap();
        std::fs::write(tmp.path().join(".git/short_ref"), "abc1234\n").unwrap();

        let handle = GitHandle::at("source", tmp.path(), ExecutionContext::Remote);
        assert_eq!(handle.reference().unwrap(), "v1.0.0");
        assert_eq!(handle.short_ref().unwrap(), "abc1234");
    }
}
