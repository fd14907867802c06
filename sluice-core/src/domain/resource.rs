//! Resource document types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resource declaration in the pipeline document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub source: Map<String, Value>,
}

impl ResourceConfig {
    /// Creates a resource declaration, dropping `null` source keys
    ///
    /// Adapters build their source with every optional field present and rely
    /// on this constructor to remove the unset ones.
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        icon: Option<&str>,
        source: Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            icon: icon.map(str::to_string),
            source: prune_nulls(source),
        }
    }
}

/// A custom resource type declaration (image providing the resource implementation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTypeConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: Map<String, Value>,
}

impl ResourceTypeConfig {
    /// Resource type served from a docker image
    pub fn docker_image(
        name: impl Into<String>,
        repository: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        let mut source = Map::new();
        source.insert("repository".to_string(), Value::String(repository.into()));
        source.insert("tag".to_string(), Value::String(tag.into()));
        Self {
            name: name.into(),
            kind: "docker-image".to_string(),
            source,
        }
    }
}

/// Removes every key whose value is `null`
pub fn prune_nulls(source: Map<String, Value>) -> Map<String, Value> {
    source.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_drops_null_source_keys() {
        let source = json!({
            "uri": "https://example.com/repo.git",
            "branch": null,
            "paths": ["src"],
        });
        let config = ResourceConfig::new(
            "repo",
            "git",
            Some("git"),
            source.as_object().cloned().unwrap(),
        );

        assert_eq!(config.source.len(), 2);
        assert!(!config.source.contains_key("branch"));
        assert_eq!(config.source["paths"], json!(["src"]));
    }

    #[test]
    fn test_icon_omitted_when_absent() {
        let config = ResourceConfig::new("image", "registry-image", None, Map::new());
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("icon").is_none());
        assert_eq!(value["type"], "registry-image");
    }

    #[test]
    fn test_docker_image_resource_type() {
        let rt = ResourceTypeConfig::docker_image("cron", "phil9909/concourse-cron-resource", "latest");
        assert_eq!(
            serde_json::to_value(&rt).unwrap(),
            json!({
                "name": "cron",
                "type": "docker-image",
                "source": {
                    "repository": "phil9909/concourse-cron-resource",
                    "tag": "latest",
                },
            })
        );
    }
}
