//! OCI registry image resource

use serde_json::json;
use sluice_core::ExecutionContext;
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::resource::{Resource, ResourceHandle, Result, fetched_dir, read_trimmed, source};

/// Image in an OCI registry (built-in `registry-image` type)
#[derive(Debug, Clone, Default)]
pub struct RegistryImage {
    pub repository: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tag: Option<String>,
    pub variant: Option<String>,
}

impl RegistryImage {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl Resource for RegistryImage {
    fn descriptor(&self, name: &str) -> ResourceConfig {
        ResourceConfig::new(
            name,
            "registry-image",
            None,
            source(json!({
                "repository": self.repository,
                "username": self.username,
                "password": self.password,
                "tag": self.tag,
                "variant": self.variant,
            })),
        )
    }

    fn resource_type(&self) -> Option<ResourceTypeConfig> {
        None
    }

    fn acquire(&self, name: &str, context: ExecutionContext) -> ResourceHandle {
        ResourceHandle::RegistryImage(RegistryImageHandle::at(name, fetched_dir(name), context))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryImageHandle {
    name: String,
    path: PathBuf,
    context: ExecutionContext,
}

impl RegistryImageHandle {
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

    /// Fetched image tag; locally `default` is returned
    pub fn tag(&self, default: Option<&str>) -> Result<Option<String>> {
        if self.context.is_remote() {
            return read_trimmed(&self.path.join("tag")).map(Some);
        }
        Ok(default.map(str::to_string))
    }
}

impl fmt::Display for RegistryImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_has_no_icon() {
        let image = RegistryImage::new("ghcr.io/acme/app").with_tag("1.0");
        let value = serde_json::to_value(image.descriptor("app-image")).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "app-image",
                "type": "registry-image",
                "source": {"repository": "ghcr.io/acme/app", "tag": "1.0"},
            })
        );
    }

    #[test]
    fn test_local_tag_returns_default() {
        let handle = RegistryImage::new("repo").acquire("img", ExecutionContext::Local);
        let image = handle.as_registry_image().unwrap();
        assert_eq!(image.tag(Some("dev")).unwrap(), Some("dev".to_string()));
        assert_eq!(image.tag(None).unwrap(), None);
    }

    #[test]
    fn test_remote_tag_read_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("tag"), "2.3.4\n").unwrap();
        let image = RegistryImageHandle::at("img", tmp.path(), ExecutionContext::Remote);
        assert_eq!(image.tag(None).unwrap(), Some("2.3.4".to_string()));
    }
}
