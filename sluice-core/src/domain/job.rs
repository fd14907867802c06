//! Job and step document types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::pipeline::ImageResource;

/// A job declaration in the pipeline document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_name: Option<String>,
    pub plan: Vec<StepConfig>,
    #[serde(default)]
    pub serial: bool,
    #[serde(default)]
    pub serial_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<Box<StepConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<Box<StepConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_abort: Option<Box<StepConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensure: Option<Box<StepConfig>>,
}

/// One fragment of a job plan
///
/// Each variant serializes to the mapping shape the orchestrator expects,
/// distinguished by its leading key (`get`, `put`, `task`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepConfig {
    Get(GetConfig),
    Put(PutConfig),
    Task(TaskStepConfig),
    InParallel(InParallelConfig),
    Do(DoConfig),
    Try(TryConfig),
}

/// `get` step: fetch a resource version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetConfig {
    pub get: String,
    #[serde(default)]
    pub trigger: bool,
    #[serde(default)]
    pub passed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
}

/// `put` step: push a new resource version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutConfig {
    pub put: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// `task` step: run a container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStepConfig {
    pub task: String,
    pub timeout: String,
    #[serde(default)]
    pub privileged: bool,
    /// Only emitted when different from 1 to keep the orchestrator UI uncluttered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    pub config: TaskConfig,
}

/// Container configuration of a task step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub platform: String,
    pub image_resource: ImageResource,
    #[serde(default)]
    pub inputs: Vec<NamedDir>,
    #[serde(default)]
    pub outputs: Vec<NamedDir>,
    #[serde(default)]
    pub caches: Vec<CacheDir>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    pub run: RunConfig,
}

/// Input or output directory of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedDir {
    pub name: String,
}

impl NamedDir {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Directory the orchestrator keeps between task runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDir {
    pub path: String,
}

/// Command a task container executes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub path: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// `in_parallel` step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InParallelConfig {
    pub in_parallel: ParallelSteps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelSteps {
    #[serde(default)]
    pub fail_fast: bool,
    pub steps: Vec<StepConfig>,
}

/// `do` step: run steps in sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoConfig {
    #[serde(rename = "do")]
    pub steps: Vec<StepConfig>,
}

/// `try` step: run a step, ignoring its failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryConfig {
    #[serde(rename = "try")]
    pub step: Box<StepConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_without_params_omits_key() {
        let step = StepConfig::Get(GetConfig {
            get: "repo".to_string(),
            trigger: true,
            passed: vec!["build".to_string()],
            params: None,
            version: None,
        });

        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({"get": "repo", "trigger": true, "passed": ["build"]})
        );
    }

    #[test]
    fn test_task_attempts_omitted_when_none() {
        let step = StepConfig::Task(TaskStepConfig {
            task: "unit-tests".to_string(),
            timeout: "5m".to_string(),
            privileged: false,
            attempts: None,
            config: TaskConfig {
                platform: "linux".to_string(),
                image_resource: ImageResource::default(),
                inputs: vec![NamedDir::new("tasks")],
                outputs: vec![],
                caches: vec![],
                params: BTreeMap::new(),
                run: RunConfig {
                    path: "scripts/ci".to_string(),
                    args: vec![],
                },
            },
        });

        let value = serde_json::to_value(&step).unwrap();
        assert!(value.get("attempts").is_none());
        assert_eq!(value["config"]["inputs"], json!([{"name": "tasks"}]));
    }

    #[test]
    fn test_nested_fragments() {
        let step = StepConfig::Try(TryConfig {
            step: Box::new(StepConfig::Do(DoConfig {
                steps: vec![StepConfig::Put(PutConfig {
                    put: "repo".to_string(),
                    params: Some(json!({"repository": "repo"})),
                })],
            })),
        });

        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({"try": {"do": [{"put": "repo", "params": {"repository": "repo"}}]}})
        );
    }

    #[test]
    fn test_fragments_parse_back_from_yaml() {
        let yaml = r#"
- get: repo
  trigger: false
  passed: [a]
- put: repo
- in_parallel:
    fail_fast: true
    steps:
      - put: other
"#;
        let steps: Vec<StepConfig> = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(steps[0], StepConfig::Get(_)));
        assert!(matches!(steps[1], StepConfig::Put(_)));
        match &steps[2] {
            StepConfig::InParallel(p) => {
                assert!(p.in_parallel.fail_fast);
                assert_eq!(p.in_parallel.steps.len(), 1);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }
}
