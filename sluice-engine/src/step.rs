//! Plan steps
//!
//! Only task steps do anything when a pipeline runs outside the
//! orchestrator; every other step exists for the document.

use serde_json::Value;
use sluice_core::domain::job::{
    DoConfig, GetConfig, InParallelConfig, ParallelSteps, PutConfig, StepConfig, TryConfig,
};
use sluice_core::normalize_name;
use std::sync::Arc;

use crate::task::{Task, TaskDefaults};

/// Upstream jobs a `get` waits for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Passed {
    /// Every job that touched the resource before this one
    #[default]
    Auto,
    /// Exactly these jobs; an empty list means no constraint
    Explicit(Vec<String>),
}

impl Passed {
    pub fn none() -> Self {
        Passed::Explicit(Vec::new())
    }

    pub fn jobs<I, S>(jobs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Passed::Explicit(jobs.into_iter().map(|j| normalize_name(j.as_ref())).collect())
    }
}

/// Options of a `get` step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetOptions {
    pub trigger: bool,
    pub passed: Passed,
    pub params: Option<Value>,
    pub version: Option<Value>,
}

impl GetOptions {
    /// A get that starts the job when a new version appears
    pub fn trigger() -> Self {
        Self {
            trigger: true,
            ..Default::default()
        }
    }

    pub fn with_passed(mut self, passed: Passed) -> Self {
        self.passed = passed;
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_version(mut self, version: Value) -> Self {
        self.version = Some(version);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetStep {
    pub resource: String,
    pub trigger: bool,
    pub passed: Vec<String>,
    pub params: Option<Value>,
    pub version: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutStep {
    pub resource: String,
    pub params: Option<Value>,
}

#[derive(Debug, Clone)]
pub enum Step {
    Get(GetStep),
    Put(PutStep),
    Task(Arc<Task>),
    Do(Vec<Step>),
    Try(Box<Step>),
    InParallel { fail_fast: bool, steps: Vec<Step> },
}

impl Step {
    /// A non-triggering get without upstream constraint, for hooks
    pub fn get(resource: impl Into<String>) -> Self {
        Step::Get(GetStep {
            resource: resource.into(),
            trigger: false,
            passed: Vec::new(),
            params: None,
            version: None,
        })
    }

    pub fn put(resource: impl Into<String>, params: Option<Value>) -> Self {
        Step::Put(PutStep {
            resource: resource.into(),
            params,
        })
    }

    /// `do`: steps run one after another
    pub fn sequence(steps: Vec<Step>) -> Self {
        Step::Do(steps)
    }

    /// `try`: the step's failure does not fail the job
    pub fn attempt(step: Step) -> Self {
        Step::Try(Box::new(step))
    }

    pub(crate) fn to_config(&self, defaults: &TaskDefaults<'_>) -> StepConfig {
        match self {
            Step::Get(get) => StepConfig::Get(GetConfig {
                get: get.resource.clone(),
                trigger: get.trigger,
                passed: get.passed.clone(),
                params: get.params.clone(),
                version: get.version.clone(),
            }),
            Step::Put(put) => StepConfig::Put(PutConfig {
                put: put.resource.clone(),
                params: put.params.clone(),
            }),
            Step::Task(task) => StepConfig::Task(task.to_config(defaults)),
            Step::Do(steps) => StepConfig::Do(DoConfig {
                steps: steps.iter().map(|s| s.to_config(defaults)).collect(),
            }),
            Step::Try(step) => StepConfig::Try(TryConfig {
                step: Box::new(step.to_config(defaults)),
            }),
            Step::InParallel { fail_fast, steps } => StepConfig::InParallel(InParallelConfig {
                in_parallel: ParallelSteps {
                    fail_fast: *fail_fast,
                    steps: steps.iter().map(|s| s.to_config(defaults)).collect(),
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_core::domain::pipeline::ImageResource;

    fn render(step: &Step) -> Value {
        let image = ImageResource::default();
        let defaults = TaskDefaults {
            image: &image,
            entrypoint: "scripts/test",
        };
        serde_json::to_value(step.to_config(&defaults)).unwrap()
    }

    #[test]
    fn test_hook_steps() {
        let ensure = Step::sequence(vec![
            Step::put("res-1", Some(json!({"test": 3}))),
            Step::attempt(Step::put("res-2", None)),
        ]);

        assert_eq!(
            render(&ensure),
            json!({
                "do": [
                    {"put": "res-1", "params": {"test": 3}},
                    {"try": {"put": "res-2"}},
                ]
            })
        );
    }

    #[test]
    fn test_get_fragment() {
        let step = Step::Get(GetStep {
            resource: "res".to_string(),
            trigger: false,
            passed: vec!["job-1".to_string()],
            params: Some(json!({"param": "ensure"})),
            version: Some(json!("every")),
        });

        assert_eq!(
            render(&step),
            json!({
                "get": "res",
                "trigger": false,
                "passed": ["job-1"],
                "params": {"param": "ensure"},
                "version": "every",
            })
        );
        assert_eq!(render(&Step::get("res"))["passed"], json!([]));
    }

    #[test]
    fn test_passed_jobs_are_normalized() {
        assert_eq!(
            Passed::jobs(["set_version", "build"]),
            Passed::Explicit(vec!["set-version".to_string(), "build".to_string()])
        );
        assert_eq!(Passed::none(), Passed::Explicit(vec![]));
        assert_eq!(GetOptions::default().passed, Passed::Auto);
        assert!(GetOptions::trigger().trigger);
    }
}
