//! Tasks
//!
//! A task is a closure registered on a job. In the pipeline document it
//! becomes a `task` step that re-invokes the pipeline entrypoint inside a
//! container (`--task <job> <task> --concourse`); locally the closure runs
//! directly. Either way its return value is cached as JSON, so a task runs at
//! most once per cache lifetime and downstream tasks read the cached value
//! through a [`CachedTask`] handle.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sluice_core::domain::job::{CacheDir, NamedDir, RunConfig, TaskConfig, TaskStepConfig};
use sluice_core::domain::pipeline::ImageResource;
use sluice_core::{CACHE_DIR, ExecutionContext, SCRIPT_DIR, normalize_name};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache;
use crate::config::{CONTEXT_ENV, Settings};
use crate::error::{CallSite, PipelineError, Result, TaskFailure};
use crate::secrets::{Secret, SecretManager, SecretScope};

const DEFAULT_TIMEOUT: &str = "5m";

type TaskBody = Box<dyn Fn(&TaskArgs) -> anyhow::Result<Value> + Send + Sync>;

/// Settings and secrets shared by all tasks of a pipeline
pub(crate) struct TaskRuntime {
    pub(crate) settings: Settings,
    pub(crate) secrets: SecretScope,
}

/// Values handed to a task body
#[derive(Debug, Clone)]
pub struct TaskArgs {
    context: ExecutionContext,
    secrets: BTreeMap<String, String>,
    outputs: BTreeMap<String, PathBuf>,
}

impl TaskArgs {
    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// Resolved value of a declared secret, by its local name
    pub fn secret(&self, name: &str) -> Result<&str> {
        self.secrets
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::UnknownTaskArgument {
                name: name.to_string(),
            })
    }

    /// Directory of a declared output; it exists when the body starts
    pub fn output(&self, name: &str) -> Result<&Path> {
        self.outputs
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| PipelineError::UnknownTaskArgument {
                name: name.to_string(),
            })
    }
}

/// A registered task
pub struct Task {
    job: String,
    name: String,
    timeout: String,
    privileged: bool,
    attempts: u32,
    caches: Vec<String>,
    secrets: BTreeMap<String, Secret>,
    outputs: Vec<String>,
    inputs: Vec<String>,
    env: BTreeMap<String, String>,
    image: Option<ImageResource>,
    body: TaskBody,
    location: CallSite,
    runtime: Arc<TaskRuntime>,
}

impl Task {
    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the task body was defined
    pub fn location(&self) -> CallSite {
        self.location
    }

    pub fn cache_file(&self) -> PathBuf {
        cache::cache_file(&self.runtime.settings.cache_root, &self.job, &self.name)
    }

    /// Directory an output is materialized in
    ///
    /// Remote: `<work_root>/<output>`, where the orchestrator collects it.
    /// Local: `<scratch_root>/<job>/<task>/<output>`.
    pub fn output_dir(&self, output: &str) -> PathBuf {
        let settings = &self.runtime.settings;
        let dir = if settings.context.is_remote() {
            settings.work_root.join(output)
        } else {
            settings
                .scratch_root
                .join(&self.job)
                .join(&self.name)
                .join(output)
        };
        std::path::absolute(&dir).unwrap_or(dir)
    }

    /// Returns the cached result, running the body only on a cache miss
    pub fn run_cached(&self) -> Result<Value> {
        let cache_file = self.cache_file();
        if let Some(value) = cache::lookup(&cache_file)? {
            debug!(
                "Using cached result of task '{}' in job '{}'",
                self.name, self.job
            );
            return Ok(value);
        }
        self.run_uncached()
    }

    /// Runs the body and overwrites the cached result
    pub fn run_uncached(&self) -> Result<Value> {
        info!("Running task '{}' in job '{}'", self.name, self.job);

        let args = self.prepare()?;

        let value = (self.body)(&args).map_err(|error| {
            PipelineError::TaskFailed(Box::new(TaskFailure {
                job: self.job.clone(),
                task: self.name.clone(),
                location: self.location,
                error,
            }))
        })?;

        cache::store(&self.cache_file(), &value)?;
        Ok(value)
    }

    /// Resolves secrets, then creates outputs
    ///
    /// A missing secret fails before anything touches the filesystem.
    fn prepare(&self) -> Result<TaskArgs> {
        let mut secrets = BTreeMap::new();
        for (local, secret) in &self.secrets {
            let value = self
                .runtime
                .secrets
                .resolve(secret.reference())?
                .unwrap_or_default();
            if value.is_empty() && !secret.is_optional() {
                return Err(PipelineError::SecretUnavailable {
                    reference: secret.reference().to_string(),
                });
            }
            secrets.insert(local.clone(), value);
        }

        let mut outputs = BTreeMap::new();
        for output in &self.outputs {
            let dir = self.output_dir(output);
            std::fs::create_dir_all(&dir).map_err(|source| PipelineError::Io {
                path: dir.clone(),
                source,
            })?;
            debug!("Prepared output '{}' at {}", output, dir.display());
            outputs.insert(output.clone(), dir);
        }

        Ok(TaskArgs {
            context: self.runtime.settings.context,
            secrets,
            outputs,
        })
    }

    pub(crate) fn to_config(&self, defaults: &TaskDefaults<'_>) -> TaskStepConfig {
        let mut inputs = vec![NamedDir::new(CACHE_DIR), NamedDir::new(SCRIPT_DIR)];
        inputs.extend(self.inputs.iter().map(NamedDir::new));

        let mut outputs = vec![NamedDir::new(CACHE_DIR)];
        outputs.extend(self.outputs.iter().map(NamedDir::new));

        let mut params = BTreeMap::new();
        for secret in self.secrets.values() {
            params.insert(
                secret.reference().to_string(),
                format!("(({}))", secret.reference()),
            );
        }
        params.insert(CONTEXT_ENV.to_string(), "true".to_string());
        params.extend(self.env.clone());

        TaskStepConfig {
            task: self.name.clone(),
            timeout: self.timeout.clone(),
            privileged: self.privileged,
            attempts: (self.attempts != 1).then_some(self.attempts),
            config: TaskConfig {
                platform: "linux".to_string(),
                image_resource: self.image.clone().unwrap_or_else(|| defaults.image.clone()),
                inputs,
                outputs,
                caches: self
                    .caches
                    .iter()
                    .map(|path| CacheDir { path: path.clone() })
                    .collect(),
                params,
                run: RunConfig {
                    path: defaults.entrypoint.to_string(),
                    args: vec![
                        "--task".to_string(),
                        self.job.clone(),
                        self.name.clone(),
                        "--concourse".to_string(),
                    ],
                },
            },
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("job", &self.job)
            .field("name", &self.name)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Pipeline-wide values a task step falls back to
pub(crate) struct TaskDefaults<'a> {
    pub(crate) image: &'a ImageResource,
    pub(crate) entrypoint: &'a str,
}

/// Typed handle to a registered task
///
/// Calling it returns the task's result, running the task first if it has
/// no cached result yet. Capture a clone in a downstream task body to depend
/// on an upstream result.
pub struct CachedTask<T> {
    task: Arc<Task>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for CachedTask<T> {
    fn clone(&self) -> Self {
        Self {
            task: Arc::clone(&self.task),
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CachedTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CachedTask").field(&self.task).finish()
    }
}

impl<T: DeserializeOwned> CachedTask<T> {
    pub fn call(&self) -> Result<T> {
        let value = self.task.run_cached()?;
        self.decode(value)
    }

    /// Runs the body even if a cached result exists
    pub fn call_uncached(&self) -> Result<T> {
        let value = self.task.run_uncached()?;
        self.decode(value)
    }

    fn decode(&self, value: Value) -> Result<T> {
        serde_json::from_value(value).map_err(|source| PipelineError::CacheFormat {
            path: self.task.cache_file(),
            source,
        })
    }
}

impl<T> CachedTask<T> {
    pub fn task(&self) -> &Task {
        &self.task
    }
}

/// Something tasks can be registered on: a job or a parallel group in a job
pub(crate) trait TaskRegistrar {
    fn job_name(&self) -> &str;

    /// Resources the job got or put so far
    fn job_inputs(&self) -> &[String];

    fn runtime(&self) -> &Arc<TaskRuntime>;

    /// Adds the task to the job registry and to the plan
    fn register(&mut self, task: Task) -> Result<Arc<Task>>;
}

/// Declares a task; finished by [`TaskBuilder::run`]
pub struct TaskBuilder<'r> {
    registrar: &'r mut dyn TaskRegistrar,
    name: String,
    timeout: String,
    privileged: bool,
    attempts: u32,
    caches: Vec<String>,
    secrets: BTreeMap<String, Secret>,
    outputs: Vec<String>,
    inputs: Vec<String>,
    env: BTreeMap<String, String>,
    image: Option<ImageResource>,
}

impl<'r> TaskBuilder<'r> {
    pub(crate) fn new(registrar: &'r mut dyn TaskRegistrar, name: &str) -> Self {
        Self {
            registrar,
            name: normalize_name(name),
            timeout: DEFAULT_TIMEOUT.to_string(),
            privileged: false,
            attempts: 1,
            caches: Vec::new(),
            secrets: BTreeMap::new(),
            outputs: Vec::new(),
            inputs: Vec::new(),
            env: BTreeMap::new(),
            image: None,
        }
    }

    /// Orchestrator timeout, e.g. `30m`
    pub fn timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = timeout.into();
        self
    }

    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// Orchestrator retries; values below 1 are raised to 1
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Directory the orchestrator keeps between runs of this task
    pub fn cache(mut self, path: impl Into<String>) -> Self {
        self.caches.push(path.into());
        self
    }

    /// Declares a secret available to the body as `args.secret(local_name)`
    pub fn secret(mut self, local_name: impl Into<String>, secret: Secret) -> Self {
        self.secrets.insert(local_name.into(), secret);
        self
    }

    /// Declares an output directory available as `args.output(name)`
    pub fn output(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.outputs, name.into());
        self
    }

    /// Declares an extra input directory (e.g. an output of an earlier task)
    pub fn input(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.inputs, name.into());
        self
    }

    /// Extra container environment
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Image overriding the pipeline default
    pub fn image(mut self, image: ImageResource) -> Self {
        self.image = Some(image);
        self
    }

    /// Registers the body and returns its handle
    ///
    /// # Errors
    /// Returns `DuplicateTask` if the job already has a task of this name.
    #[track_caller]
    pub fn run<T, F>(self, body: F) -> Result<CachedTask<T>>
    where
        T: Serialize + DeserializeOwned + 'static,
        F: Fn(&TaskArgs) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let location = Location::caller();

        let mut inputs = Vec::new();
        for input in self.registrar.job_inputs().iter().chain(&self.inputs) {
            push_unique(&mut inputs, input.clone());
        }

        let task = Task {
            job: self.registrar.job_name().to_string(),
            name: self.name,
            timeout: self.timeout,
            privileged: self.privileged,
            attempts: self.attempts,
            caches: self.caches,
            secrets: self.secrets,
            outputs: self.outputs,
            inputs,
            env: self.env,
            image: self.image,
            body: Box::new(move |args: &TaskArgs| {
                let result = body(args)?;
                Ok(serde_json::to_value(result)?)
            }),
            location,
            runtime: Arc::clone(self.registrar.runtime()),
        };

        let task = self.registrar.register(task)?;
        Ok(CachedTask {
            task,
            marker: PhantomData,
        })
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}
