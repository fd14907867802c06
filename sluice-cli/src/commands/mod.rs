//! Commands module
//!
//! What a pipeline binary can be asked to do, and the handlers for each.

mod publish;
mod run;

use anyhow::Result;
use sluice_engine::Pipeline;

/// Action selected by the command-line flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Clear the cache and run every job
    Run,
    /// Run one task and print its result
    RunTask { job: String, task: String },
    /// Print the pipeline document
    Dump,
    /// Upload the pipeline document with `fly`
    Upload { target: String },
}

/// Handle a command
///
/// Routes the command to the appropriate handler module.
pub fn handle_command(command: Command, pipeline: &Pipeline) -> Result<()> {
    match command {
        Command::Run => run::run_pipeline(pipeline),
        Command::RunTask { job, task } => run::run_task(pipeline, &job, &task),
        Command::Dump => publish::dump(pipeline),
        Command::Upload { target } => publish::upload(pipeline, &target),
    }
}
