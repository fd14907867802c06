//! Cron trigger resource

use serde_json::json;
use sluice_core::ExecutionContext;
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};

use crate::resource::{Resource, ResourceHandle, source};

/// Emits a new version on a cron schedule; used as a job trigger
#[derive(Debug, Clone)]
pub struct Cron {
    pub definition: String,
    pub location: String,
}

impl Cron {
    pub fn new(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            location: "Europe/Berlin".to_string(),
        }
    }
}

impl Resource for Cron {
    fn descriptor(&self, name: &str) -> ResourceConfig {
        ResourceConfig::new(
            name,
            "cron",
            Some("clock-outline"),
            source(json!({
                "cron": self.definition,
                "location": self.location,
            })),
        )
    }

    fn resource_type(&self) -> Option<ResourceTypeConfig> {
        Some(ResourceTypeConfig::docker_image(
            "cron",
            "phil9909/concourse-cron-resource",
            "latest",
        ))
    }

    fn acquire(&self, _name: &str, _context: ExecutionContext) -> ResourceHandle {
        ResourceHandle::None
    }
}
