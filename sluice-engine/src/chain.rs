//! Resource chains
//!
//! Every registered resource carries the ordered list of jobs that touched it
//! so far. A job that gets the resource later may only see versions that went
//! through all of them, which is how job ordering follows from the order in
//! which jobs are declared.

use sluice_core::domain::resource::{ResourceConfig, ResourceTypeConfig, prune_nulls};
use sluice_core::ExecutionContext;
use sluice_resources::{Resource, ResourceHandle};

pub struct ResourceChain {
    name: String,
    resource: Box<dyn Resource>,
    passed: Vec<String>,
}

impl ResourceChain {
    pub fn new(name: impl Into<String>, resource: impl Resource + 'static) -> Self {
        Self {
            name: name.into(),
            resource: Box::new(resource),
            passed: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Jobs that got or put this resource, in declaration order
    pub fn passed(&self) -> &[String] {
        &self.passed
    }

    /// Declaration under `resources`; null source keys are dropped
    pub fn descriptor(&self) -> ResourceConfig {
        let mut config = self.resource.descriptor(&self.name);
        config.source = prune_nulls(config.source);
        config
    }

    pub fn resource_type(&self) -> Option<ResourceTypeConfig> {
        self.resource.resource_type()
    }

    pub fn handle(&self, context: ExecutionContext) -> ResourceHandle {
        self.resource.acquire(&self.name, context)
    }

    /// Appends `job` unless it is already part of the chain
    pub(crate) fn record(&mut self, job: &str) {
        if !self.passed.iter().any(|j| j == job) {
            self.passed.push(job.to_string());
        }
    }
}
