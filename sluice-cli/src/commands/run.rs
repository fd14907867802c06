//! Run command handlers

use anyhow::Result;
use colored::*;
use sluice_engine::Pipeline;

/// Runs every job of the pipeline from an empty cache
pub fn run_pipeline(pipeline: &Pipeline) -> Result<()> {
    pipeline.run()?;

    eprintln!(
        "{}",
        format!("✓ Pipeline '{}' completed", pipeline.name())
            .green()
            .bold()
    );
    Ok(())
}

/// Runs one task and prints its cached JSON result on stdout
pub fn run_task(pipeline: &Pipeline, job: &str, task: &str) -> Result<()> {
    let value = pipeline.run_task(job, task)?;
    println!("{}", serde_json::to_string(&value)?);
    Ok(())
}
