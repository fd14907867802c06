//! Lock pool resource

use serde_json::json;
use sluice_core::ExecutionContext;
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};

use crate::resource::{DirectoryHandle, Resource, ResourceHandle, source};

/// Locks stored in a git repository, used to serialize access to shared
/// environments across pipelines
#[derive(Debug, Clone)]
pub struct Pool {
    pub uri: String,
    pub branch: String,
    pub pool: String,
    pub username: String,
    pub password: String,
}

impl Resource for Pool {
    fn descriptor(&self, name: &str) -> ResourceConfig {
        ResourceConfig::new(
            name,
            "pool-stable",
            Some("lock"),
            source(json!({
                "uri": self.uri,
                "branch": self.branch,
                "pool": self.pool,
                "username": self.username,
                "password": self.password,
            })),
        )
    }

    fn resource_type(&self) -> Option<ResourceTypeConfig> {
        Some(ResourceTypeConfig::docker_image(
            "pool-stable",
            "concourse/pool-resource",
            "1.1.1",
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
    fn test_descriptor_and_type() {
        let pool = Pool {
            uri: "uri".to_string(),
            branch: "branch".to_string(),
            pool: "pool".to_string(),
            username: "username".to_string(),
            password: "password".to_string(),
        };

        assert_eq!(
            serde_json::to_value(pool.descriptor("test")).unwrap(),
            json!({
                "name": "test",
                "type": "pool-stable",
                "icon": "lock",
                "source": {
                    "uri": "uri",
                    "branch": "branch",
                    "pool": "pool",
                    "username": "username",
                    "password": "password",
                },
            })
        );

        let rt = pool.resource_type().unwrap();
        assert_eq!(rt.name, "pool-stable");
        assert_eq!(rt.source["repository"], "concourse/pool-resource");
        assert_eq!(rt.source["tag"], "1.1.1");
    }
}
