//! PyPI package resource

use serde_json::json;
use sluice_core::ExecutionContext;
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};

use crate::resource::{DirectoryHandle, Resource, ResourceHandle, source};

#[derive(Debug, Clone)]
pub struct PyPi {
    pub package: String,
}

impl PyPi {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
        }
    }
}

impl Resource for PyPi {
    fn descriptor(&self, name: &str) -> ResourceConfig {
        ResourceConfig::new(
            name,
            "pypi",
            Some("language-python"),
            source(json!({ "name": self.package })),
        )
    }

    fn resource_type(&self) -> Option<ResourceTypeConfig> {
        Some(ResourceTypeConfig::docker_image(
            "pypi",
            "cfplatformeng/concourse-pypi-resource",
            "latest",
        ))
    }

    fn acquire(&self, name: &str, _context: ExecutionContext) -> ResourceHandle {
        ResourceHandle::Directory(DirectoryHandle::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor() {
        let pypi = PyPi::new("requests");
        assert_eq!(
            serde_json::to_value(pypi.descriptor("requests")).unwrap(),
            json!({
                "name": "requests",
                "type": "pypi",
                "icon": "language-python",
                "source": {"name": "requests"},
            })
        );
    }
}
