//! Pipeline document types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::job::JobConfig;
use super::resource::{ResourceConfig, ResourceTypeConfig};

/// Declarative pipeline document
///
/// Top-level mapping consumed by the orchestrator (`fly set-pipeline`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub resource_types: Vec<ResourceTypeConfig>,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// A named group of jobs shown together in the orchestrator UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    pub jobs: Vec<String>,
}

/// Container image a task runs in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: Map<String, Value>,
}

impl ImageResource {
    /// Image pulled from an OCI registry through the built-in `registry-image` type
    pub fn registry(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        let source = json!({
            "repository": repository.into(),
            "tag": tag.into(),
        });
        Self {
            kind: "registry-image".to_string(),
            source: source.as_object().cloned().unwrap_or_default(),
        }
    }
}

impl Default for ImageResource {
    fn default() -> Self {
        Self::registry("debian", "bookworm-slim")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_image() {
        let image = ImageResource::default();
        assert_eq!(image.kind, "registry-image");
        assert_eq!(image.source["repository"], "debian");
        assert_eq!(image.source["tag"], "bookworm-slim");
    }

    #[test]
    fn test_empty_document_serializes_all_sections() {
        let doc = Document {
            resource_types: vec![],
            resources: vec![],
            jobs: vec![],
            groups: vec![],
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "resource_types": [],
                "resources": [],
                "jobs": [],
                "groups": [],
            })
        );
    }
}
