//! Google Cloud Storage resource

use serde_json::json;
use sluice_core::ExecutionContext;
use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig};

use crate::resource::{DirectoryHandle, Resource, ResourceHandle, source};

/// Objects in a GCS bucket matched by a versioned file name pattern
#[derive(Debug, Clone)]
pub struct GoogleCloudStorage {
    pub bucket: String,
    pub regexp: String,
    /// Service account JSON key
    pub credentials: String,
}

impl Resource for GoogleCloudStorage {
    fn descriptor(&self, name: &str) -> ResourceConfig {
        ResourceConfig::new(
            name,
            "gcs",
            Some("file-cloud"),
            source(json!({
                "bucket": self.bucket,
                "regexp": self.regexp,
                "json_key": self.credentials,
            })),
        )
    }

    fn resource_type(&self) -> Option<ResourceTypeConfig> {
        Some(ResourceTypeConfig::docker_image(
            "gcs",
            "frodenas/gcs-resource",
            "latest",
        ))
    }

    fn acquire(&self, name: &str, _context: ExecutionContext) -> ResourceHandle {
        ResourceHandle::Directory(DirectoryHandle::new(name))
    }
}
