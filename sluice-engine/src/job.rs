//! Jobs
//!
//! A job is an ordered plan of steps plus the registry of its tasks. The plan
//! is what the orchestrator runs; the registry is what runs locally, in
//! registration order, one task at a time.

use serde_json::Value;
use sluice_core::domain::job::JobConfig;
use sluice_core::normalize_name;
use sluice_resources::ResourceHandle;
use std::panic::Location;
use std::sync::Arc;
use tracing::info;

use crate::cache::remove_dir_if_exists;
use crate::chain::ResourceChain;
use crate::error::{CallSite, PipelineError, Result};
use crate::step::{GetOptions, GetStep, Passed, PutStep, Step};
use crate::task::{Task, TaskBuilder, TaskDefaults, TaskRegistrar, TaskRuntime};

pub struct Job {
    name: String,
    old_name: Option<String>,
    plan: Vec<Step>,
    tasks: Vec<Arc<Task>>,
    inputs: Vec<String>,
    on_success: Option<Step>,
    on_failure: Option<Step>,
    on_abort: Option<Step>,
    ensure: Option<Step>,
    serial: bool,
    serial_groups: Vec<String>,
    groups: Vec<String>,
    runtime: Arc<TaskRuntime>,
}

impl Job {
    pub(crate) fn new(name: String, runtime: Arc<TaskRuntime>) -> Self {
        Self {
            name,
            old_name: None,
            plan: Vec::new(),
            tasks: Vec::new(),
            inputs: Vec::new(),
            on_success: None,
            on_failure: None,
            on_abort: None,
            ensure: None,
            serial: false,
            serial_groups: Vec::new(),
            groups: Vec::new(),
            runtime,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plan(&self) -> &[Step] {
        &self.plan
    }

    /// Registered tasks in execution order
    pub fn tasks(&self) -> &[Arc<Task>] {
        &self.tasks
    }

    /// Resources the job gets or puts, in first-touch order
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Looks a task up by exact name, then by its dash-case form
    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        let normalized = normalize_name(name);
        self.tasks
            .iter()
            .find(|t| t.name() == name)
            .or_else(|| self.tasks.iter().find(|t| t.name() == normalized))
    }

    /// Runs every task through the cache, in registration order
    pub fn run(&self) -> Result<()> {
        info!("Running job '{}' ({} tasks)", self.name, self.tasks.len());
        self.cleanup_outputs()?;
        for task in &self.tasks {
            task.run_cached()?;
        }
        Ok(())
    }

    /// Runs a single task through the cache and returns its result
    pub fn run_task(&self, name: &str) -> Result<Value> {
        self.cleanup_outputs()?;
        let task = self.task(name).ok_or_else(|| PipelineError::TaskNotFound {
            job: self.name.clone(),
            name: name.to_string(),
            available: self.tasks.iter().map(|t| t.name().to_string()).collect(),
        })?;
        task.run_cached()
    }

    /// Removes the job's local scratch directory
    fn cleanup_outputs(&self) -> Result<()> {
        let settings = &self.runtime.settings;
        if settings.context.is_remote() {
            return Ok(());
        }
        let dir = settings.scratch_root.join(&self.name);
        remove_dir_if_exists(&dir).map_err(|source| PipelineError::Io { path: dir, source })
    }

    pub(crate) fn to_config(&self, defaults: &TaskDefaults<'_>) -> JobConfig {
        let hook = |step: &Option<Step>| step.as_ref().map(|s| Box::new(s.to_config(defaults)));
        JobConfig {
            name: self.name.clone(),
            old_name: self.old_name.clone(),
            plan: self.plan.iter().map(|s| s.to_config(defaults)).collect(),
            serial: self.serial,
            serial_groups: self.serial_groups.clone(),
            on_success: hook(&self.on_success),
            on_failure: hook(&self.on_failure),
            on_abort: hook(&self.on_abort),
            ensure: hook(&self.ensure),
        }
    }

    fn add_input(&mut self, resource: &str) {
        if !self.inputs.iter().any(|r| r == resource) {
            self.inputs.push(resource.to_string());
        }
    }
}

/// The job being declared together with the pipeline's resources
struct JobScope<'p> {
    job: &'p mut Job,
    resources: &'p mut [ResourceChain],
}

impl JobScope<'_> {
    fn chain(&mut self, name: &str, location: CallSite) -> Result<&mut ResourceChain> {
        let index = self
            .resources
            .iter()
            .position(|chain| chain.name() == name)
            .ok_or_else(|| PipelineError::ResourceNotConfigured {
                name: name.to_string(),
                available: self.resources.iter().map(|c| c.name().to_string()).collect(),
                location,
            })?;
        Ok(&mut self.resources[index])
    }

    fn get(
        &mut self,
        name: &str,
        options: GetOptions,
        location: CallSite,
    ) -> Result<(Step, ResourceHandle)> {
        let job = self.job.name.clone();
        let context = self.job.runtime.settings.context;
        let chain = self.chain(name, location)?;

        let passed = match options.passed {
            Passed::Auto => chain.passed().to_vec(),
            Passed::Explicit(jobs) => jobs,
        };
        chain.record(&job);
        let handle = chain.handle(context);

        self.job.add_input(name);
        let step = Step::Get(GetStep {
            resource: name.to_string(),
            trigger: options.trigger,
            passed,
            params: options.params,
            version: options.version,
        });
        Ok((step, handle))
    }

    fn put(
        &mut self,
        name: &str,
        params: Option<Value>,
        location: CallSite,
    ) -> Result<(Step, ResourceHandle)> {
        let job = self.job.name.clone();
        let context = self.job.runtime.settings.context;
        let chain = self.chain(name, location)?;

        chain.record(&job);
        let handle = chain.handle(context);

        self.job.add_input(name);
        let step = Step::Put(PutStep {
            resource: name.to_string(),
            params,
        });
        Ok((step, handle))
    }

    fn register(&mut self, task: Task) -> Result<Arc<Task>> {
        if self.job.tasks.iter().any(|t| t.name() == task.name()) {
            return Err(PipelineError::DuplicateTask {
                job: self.job.name.clone(),
                name: task.name().to_string(),
                location: task.location(),
            });
        }
        let task = Arc::new(task);
        self.job.tasks.push(Arc::clone(&task));
        Ok(task)
    }
}

/// Declares the steps of a job
///
/// Obtained from [`PipelineBuilder::job`](crate::PipelineBuilder::job).
pub struct JobBuilder<'p> {
    scope: JobScope<'p>,
}

impl<'p> JobBuilder<'p> {
    pub(crate) fn new(job: &'p mut Job, resources: &'p mut [ResourceChain]) -> Self {
        Self {
            scope: JobScope { job, resources },
        }
    }

    pub fn name(&self) -> &str {
        &self.scope.job.name
    }

    /// Adds a non-triggering `get` that waits for every earlier job touching
    /// the resource
    #[track_caller]
    pub fn get(&mut self, name: &str) -> Result<ResourceHandle> {
        self.get_with(name, GetOptions::default())
    }

    #[track_caller]
    pub fn get_with(&mut self, name: &str, options: GetOptions) -> Result<ResourceHandle> {
        let (step, handle) = self.scope.get(name, options, Location::caller())?;
        self.scope.job.plan.push(step);
        Ok(handle)
    }

    #[track_caller]
    pub fn put(&mut self, name: &str, params: Option<Value>) -> Result<ResourceHandle> {
        let (step, handle) = self.scope.put(name, params, Location::caller())?;
        self.scope.job.plan.push(step);
        Ok(handle)
    }

    /// Starts declaring a task; see [`TaskBuilder::run`]
    pub fn task(&mut self, name: &str) -> TaskBuilder<'_> {
        TaskBuilder::new(self, name)
    }

    /// Groups steps into one `in_parallel` step
    ///
    /// Tasks declared in the group still run one after another, in
    /// declaration order, when the job runs locally.
    pub fn in_parallel<R, F>(&mut self, fail_fast: bool, build: F) -> Result<R>
    where
        F: FnOnce(&mut ParallelBuilder<'_, 'p>) -> Result<R>,
    {
        let mut group = ParallelBuilder {
            scope: &mut self.scope,
            steps: Vec::new(),
        };
        let result = build(&mut group)?;
        let steps = group.steps;
        self.scope
            .job
            .plan
            .push(Step::InParallel { fail_fast, steps });
        Ok(result)
    }

    /// Appends a step as is (e.g. a `do` or `try` built from [`Step`])
    pub fn add_step(&mut self, step: Step) -> &mut Self {
        self.scope.job.plan.push(step);
        self
    }

    pub fn on_success(&mut self, step: Step) -> &mut Self {
        self.scope.job.on_success = Some(step);
        self
    }

    pub fn on_failure(&mut self, step: Step) -> &mut Self {
        self.scope.job.on_failure = Some(step);
        self
    }

    pub fn on_abort(&mut self, step: Step) -> &mut Self {
        self.scope.job.on_abort = Some(step);
        self
    }

    pub fn ensure(&mut self, step: Step) -> &mut Self {
        self.scope.job.ensure = Some(step);
        self
    }

    pub fn serial(&mut self, serial: bool) -> &mut Self {
        self.scope.job.serial = serial;
        self
    }

    pub fn serial_groups<I, S>(&mut self, groups: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.job.serial_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Tags the job for the document's `groups` section
    pub fn groups<I, S>(&mut self, groups: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.job.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Previous name of a renamed job, so the orchestrator keeps its history
    pub fn old_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.scope.job.old_name = Some(name.into());
        self
    }
}

impl TaskRegistrar for JobBuilder<'_> {
    fn job_name(&self) -> &str {
        &self.scope.job.name
    }

    fn job_inputs(&self) -> &[String] {
        &self.scope.job.inputs
    }

    fn runtime(&self) -> &Arc<TaskRuntime> {
        &self.scope.job.runtime
    }

    fn register(&mut self, task: Task) -> Result<Arc<Task>> {
        let task = self.scope.register(task)?;
        self.scope.job.plan.push(Step::Task(Arc::clone(&task)));
        Ok(task)
    }
}

/// Declares the steps of an `in_parallel` group
pub struct ParallelBuilder<'a, 'p> {
    scope: &'a mut JobScope<'p>,
    steps: Vec<Step>,
}

impl ParallelBuilder<'_, '_> {
    #[track_caller]
    pub fn get(&mut self, name: &str) -> Result<ResourceHandle> {
        self.get_with(name, GetOptions::default())
    }

    #[track_caller]
    pub fn get_with(&mut self, name: &str, options: GetOptions) -> Result<ResourceHandle> {
        let (step, handle) = self.scope.get(name, options, Location::caller())?;
        self.steps.push(step);
        Ok(handle)
    }

    #[track_caller]
    pub fn put(&mut self, name: &str, params: Option<Value>) -> Result<ResourceHandle> {
        let (step, handle) = self.scope.put(name, params, Location::caller())?;
        self.steps.push(step);
        Ok(handle)
    }

    pub fn task(&mut self, name: &str) -> TaskBuilder<'_> {
        TaskBuilder::new(self, name)
    }
}

impl TaskRegistrar for ParallelBuilder<'_, '_> {
    fn job_name(&self) -> &str {
        &self.scope.job.name
    }

    fn job_inputs(&self) -> &[String] {
        &self.scope.job.inputs
    }

    fn runtime(&self) -> &Arc<TaskRuntime> {
        &self.scope.job.runtime
    }

    fn register(&mut self, task: Task) -> Result<Arc<Task>> {
        let task = self.scope.register(task)?;
        self.steps.push(Step::Task(Arc::clone(&task)));
        Ok(task)
    }
}
