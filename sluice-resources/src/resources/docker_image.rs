//! Docker image resource

use serde_json::json;
use sluice_core::ExecutionContext;
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};
use std::path::{Path, PathBuf};

use crate::resource::{Resource, ResourceHandle, Result, fetched_dir, read_trimmed, source};

/// Image handled by the built-in `docker-image` type
#[derive(Debug, Clone)]
pub struct DockerImage {
    pub repository: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tag: String,
}

impl DockerImage {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            username: None,
            password: None,
            tag: "latest".to_string(),
        }
    }
}

impl Resource for DockerImage {
    fn descriptor(&self, name: &str) -> ResourceConfig {
        ResourceConfig::new(
            name,
            "docker-image",
            Some("docker"),
            source(json!({
                "repository": self.repository,
                "username": self.username,
                "password": self.password,
                "tag": self.tag,
            })),
        )
    }

    fn resource_type(&self) -> Option<ResourceTypeConfig> {
        None
    }

    fn acquire(&self, name: &str, context: ExecutionContext) -> ResourceHandle {
        ResourceHandle::DockerImage(DockerImageHandle::at(fetched_dir(name), context))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerImageHandle {
    path: PathBuf,
    context: ExecutionContext,
}

impl DockerImageHandle {
    pub fn at(path: impl Into<PathBuf>, context: ExecutionContext) -> Self {
        Self {
            path: path.into(),
            context,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Digest of the fetched image; `latest` when running locally
    pub fn digest(&self) -> Result<String> {
        if self.context.is_remote() {
            return read_trimmed(&self.path.join("digest"));
        }
        Ok("latest".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor() {
        let image = DockerImage {
            repository: "repo".to_string(),
            username: Some("username".to_string()),
            password: Some("password".to_string()),
            tag: "tag".to_string(),
        };

        assert_eq!(
            serde_json::to_value(image.descriptor("test")).unwrap(),
            json!({
                "name": "test",
                "type": "docker-image",
                "icon": "docker",
                "source": {
                    "repository": "repo",
                    "username": "username",
                    "password": "password",
                    "tag": "tag",
                },
            })
        );

        let handle = image.acquire("test", ExecutionContext::Local);
        assert_eq!(handle.as_docker_image().unwrap().digest().unwrap(), "latest");
    }
}
