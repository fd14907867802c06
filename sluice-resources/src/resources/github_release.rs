//! GitHub release resource

use regex::Regex;
use serde_json::json;
use sluice_core::ExecutionContext;
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::resource::{Resource, ResourceHandle, Result, fetched_dir, read_trimmed, source};

static API_VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/v[0-9]/*").expect("static pattern"));

/// Releases of a GitHub repository (built-in `github-release` type)
#[derive(Debug, Clone)]
pub struct GithubRelease {
    pub owner: String,
    pub repo: String,
    pub access_token: Option<String>,
    pub pre_release: bool,
    pub release: bool,
    pub github_api_url: Option<String>,
    pub github_v4_api_url: Option<String>,
    pub github_uploads_url: Option<String>,
    pub tag_filter: Option<String>,
    pub order_by: Option<String>,
}

impl GithubRelease {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            access_token: None,
            pre_release: false,
            release: true,
            github_api_url: None,
            github_v4_api_url: None,
            github_uploads_url: None,
            tag_filter: None,
            order_by: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Points the resource at a GitHub Enterprise API.
    ///
    /// The GraphQL endpoint is derived from it unless set explicitly.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = Some(url.into());
        self
    }

    fn v4_api_url(&self) -> Option<String> {
        self.github_v4_api_url.clone().or_else(|| {
            self.github_api_url
                .as_deref()
                .map(|url| API_VERSION_SEGMENT.replace_all(url, "/graphql").into_owned())
        })
    }
}

impl Resource for GithubRelease {
    fn descriptor(&self, name: &str) -> ResourceConfig {
        ResourceConfig::new(
            name,
            "github-release",
            Some("github"),
            source(json!({
                "owner": self.owner,
                "repository": self.repo,
                "access_token": self.access_token,
                "pre_release": self.pre_release,
                "release": self.release,
                "github_api_url": self.github_api_url,
                "github_v4_api_url": self.v4_api_url(),
                "github_uploads_url": self.github_uploads_url,
                "tag_filter": self.tag_filter,
                "order_by": self.order_by,
            })),
        )
    }

    fn resource_type(&self) -> Option<ResourceTypeConfig> {
        None
    }

    fn acquire(&self, name: &str, context: ExecutionContext) -> ResourceHandle {
        ResourceHandle::GithubRelease(GithubReleaseHandle::at(name, fetched_dir(name), context))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubReleaseHandle {
    name: String,
    path: PathBuf,
    context: ExecutionContext,
}

impl GithubReleaseHandle {
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

    /// Release tag; locally `default` is returned
    pub fn tag(&self, default: Option<&str>) -> Result<Option<String>> {
        if self.context.is_remote() {
            return read_trimmed(&self.path.join("tag")).map(Some);
        }
        Ok(default.map(str::to_string))
    }
}

impl fmt::Display for GithubReleaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let release = GithubRelease::new("acme", "tool");
        assert_eq!(
            serde_json::to_value(release.descriptor("tool")).unwrap(),
            json!({
                "name": "tool",
                "type": "github-release",
                "icon": "github",
                "source": {
                    "owner": "acme",
                    "repository": "tool",
                    "pre_release": false,
                    "release": true,
                },
            })
        );
        assert!(release.resource_type().is_none());
    }

    #[test]
    fn test_v4_url_derived_from_api_url() {
        let release =
            GithubRelease::new("acme", "tool").with_api_url("https://github.example.com/api/v3/");
        let config = release.descriptor("tool");
        assert_eq!(
            config.source["github_v4_api_url"],
            "https://github.example.com/api/graphql"
        );

        let mut explicit = release.clone();
        explicit.github_v4_api_url = Some("https://graphql.example.com".to_string());
        assert_eq!(
            explicit.descriptor("tool").source["github_v4_api_url"],
            "https://graphql.example.com"
        );
    }

    #[test]
    fn test_tag() {
        let local = GithubReleaseHandle::at("tool", "tool", ExecutionContext::Local);
        assert_eq!(local.tag(Some("v0.0.0")).unwrap().as_deref(), Some("v0.0.0"));
        assert_eq!(local.tag(None).unwrap(), None);

        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("tag"), "v1.4.0\n").unwrap();
        let remote = GithubReleaseHandle::at("tool", tmp.path(), ExecutionContext::Remote);
        assert_eq!(remote.tag(None).unwrap().as_deref(), Some("v1.4.0"));
    }
}
