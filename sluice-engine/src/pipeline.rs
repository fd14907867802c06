//! Pipelines
//!
//! A pipeline is declared once through a [`PipelineBuilder`] and then frozen
//! into a [`Pipeline`], which can either run its tasks or emit the document
//! the orchestrator consumes.

use serde_json::Value;
use sluice_core::domain::pipeline::{Document, GroupConfig, ImageResource};
use sluice_core::domain::resource::ResourceTypeConfig;
use sluice_core::{SCRIPT_DIR, normalize_name};
use sluice_resources::Resource;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache;
use crate::chain::ResourceChain;
use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::job::{Job, JobBuilder};
use crate::secrets::{SecretManager, SecretScope};
use crate::task::{TaskDefaults, TaskRuntime};

const DEFAULT_TEAM: &str = "main";

pub struct PipelineBuilder {
    name: String,
    team: String,
    image: ImageResource,
    entrypoint: Option<String>,
    runtime: Arc<TaskRuntime>,
    resources: Vec<ResourceChain>,
    jobs: Vec<Job>,
}

impl PipelineBuilder {
    /// Creates an empty pipeline
    ///
    /// Secrets are resolved through the backend named in `settings`, scoped to
    /// the `main` team until [`with_team`](Self::with_team) says otherwise.
    pub fn new(name: impl Into<String>, settings: Settings) -> Self {
        let secrets = SecretScope::new(DEFAULT_TEAM, settings.secret_source.manager());
        Self {
            name: name.into(),
            team: DEFAULT_TEAM.to_string(),
            image: ImageResource::default(),
            entrypoint: None,
            runtime: Arc::new(TaskRuntime { settings, secrets }),
            resources: Vec::new(),
            jobs: Vec::new(),
        }
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = team.into();
        self.runtime.secrets.set_team(&self.team);
        self
    }

    /// Default image of task containers
    pub fn with_image(mut self, image: ImageResource) -> Self {
        self.image = image;
        self
    }

    /// Path of the pipeline binary inside task containers
    /// (default: `scripts/<pipeline name>`)
    pub fn with_entrypoint(mut self, path: impl Into<String>) -> Self {
        self.entrypoint = Some(path.into());
        self
    }

    /// Replaces the secret backend chosen by the settings
    pub fn with_secret_manager(self, manager: impl SecretManager + 'static) -> Self {
        self.runtime.secrets.set_manager(Arc::new(manager));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.runtime.settings
    }

    /// Registers a resource under a unique name
    pub fn resource(&mut self, name: &str, resource: impl Resource + 'static) -> Result<()> {
        if self.resources.iter().any(|chain| chain.name() == name) {
            return Err(PipelineError::DuplicateResource {
                name: name.to_string(),
            });
        }
        debug!("Registered resource '{}'", name);
        self.resources.push(ResourceChain::new(name, resource));
        Ok(())
    }

    /// Declares a job; the name is normalized to dash-case
    pub fn job(&mut self, name: &str) -> Result<JobBuilder<'_>> {
        let name = normalize_name(name);
        if self.jobs.iter().any(|job| job.name() == name) {
            return Err(PipelineError::DuplicateJob { name });
        }

        let index = self.jobs.len();
        self.jobs.push(Job::new(name, Arc::clone(&self.runtime)));
        Ok(JobBuilder::new(&mut self.jobs[index], &mut self.resources))
    }

    pub fn build(self) -> Pipeline {
        let entrypoint = self
            .entrypoint
            .unwrap_or_else(|| format!("{}/{}", SCRIPT_DIR, self.name));
        Pipeline {
            name: self.name,
            team: self.team,
            image: self.image,
            entrypoint,
            runtime: self.runtime,
            resources: self.resources,
            jobs: self.jobs,
        }
    }
}

pub struct Pipeline {
    name: String,
    team: String,
    image: ImageResource,
    entrypoint: String,
    runtime: Arc<TaskRuntime>,
    resources: Vec<ResourceChain>,
    jobs: Vec<Job>,
}

impl Pipeline {
    pub fn builder(name: impl Into<String>, settings: Settings) -> PipelineBuilder {
        PipelineBuilder::new(name, settings)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn settings(&self) -> &Settings {
        &self.runtime.settings
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Looks a job up by exact name, then by its dash-case form
    pub fn job(&self, name: &str) -> Option<&Job> {
        let normalized = normalize_name(name);
        self.jobs
            .iter()
            .find(|j| j.name() == name)
            .or_else(|| self.jobs.iter().find(|j| j.name() == normalized))
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceChain> {
        self.resources.iter().find(|chain| chain.name() == name)
    }

    /// Clears the task cache, then runs every job in declaration order
    pub fn run(&self) -> Result<()> {
        let settings = &self.runtime.settings;
        info!(
            "Running pipeline '{}' ({} jobs, context={})",
            self.name,
            self.jobs.len(),
            settings.context
        );
        cache::clear(&settings.cache_root)?;
        for job in &self.jobs {
            job.run()?;
        }
        info!("Pipeline '{}' completed", self.name);
        Ok(())
    }

    /// Runs one task through the cache and returns its result
    pub fn run_task(&self, job: &str, task: &str) -> Result<Value> {
        let found = self.job(job).ok_or_else(|| PipelineError::JobNotFound {
            name: job.to_string(),
            available: self.jobs.iter().map(|j| j.name().to_string()).collect(),
        })?;
        found.run_task(task)
    }

    /// Builds the declarative document
    pub fn emit(&self) -> Document {
        let defaults = TaskDefaults {
            image: &self.image,
            entrypoint: &self.entrypoint,
        };

        let mut resource_types: Vec<ResourceTypeConfig> = Vec::new();
        for resource_type in self.resources.iter().filter_map(ResourceChain::resource_type) {
            if !resource_types.iter().any(|t| t.name == resource_type.name) {
                resource_types.push(resource_type);
            }
        }

        let mut groups: Vec<GroupConfig> = Vec::new();
        for job in &self.jobs {
            for tag in job.groups() {
                match groups.iter_mut().find(|g| &g.name == tag) {
                    Some(group) => group.jobs.push(job.name().to_string()),
                    None => groups.push(GroupConfig {
                        name: tag.clone(),
                        jobs: vec![job.name().to_string()],
                    }),
                }
            }
        }

        Document {
            resource_types,
            resources: self.resources.iter().map(ResourceChain::descriptor).collect(),
            jobs: self.jobs.iter().map(|job| job.to_config(&defaults)).collect(),
            groups,
        }
    }

    pub fn emit_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.emit())?)
    }
}
