//! Document command handlers
//!
//! Printing the pipeline document and uploading it with the `fly` CLI.

use anyhow::{Context, Result};
use colored::*;
use sluice_core::command::run_inherited;
use sluice_engine::Pipeline;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn dump(pipeline: &Pipeline) -> Result<()> {
    print!("{}", pipeline.emit_yaml()?);
    Ok(())
}

/// Writes the document to a temporary file and sets it on the target
pub fn upload(pipeline: &Pipeline, target: &str) -> Result<()> {
    let file = document_path(pipeline.name());
    std::fs::write(&file, pipeline.emit_yaml()?)
        .with_context(|| format!("Failed to write pipeline document: {}", file.display()))?;

    info!(
        "Uploading pipeline '{}' to target '{}'",
        pipeline.name(),
        target
    );
    let args = set_pipeline_args(target, &file, pipeline.name());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run_inherited("fly", &args).context("fly set-pipeline failed")?;

    eprintln!("{}", "✓ Pipeline uploaded successfully!".green().bold());
    eprintln!("  Target:   {}", target.cyan());
    eprintln!("  Pipeline: {}", pipeline.name().bold());
    Ok(())
}

fn document_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}.yaml", name))
}

fn set_pipeline_args(target: &str, file: &Path, pipeline: &str) -> Vec<String> {
    vec![
        "-t".to_string(),
        target.to_string(),
        "set-pipeline".to_string(),
        "-c".to_string(),
        file.display().to_string(),
        "-p".to_string(),
        pipeline.to_string(),
        "-n".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_pipeline_args() {
        let file = document_path("release");
        assert!(file.ends_with("release.yaml"));

        let args = set_pipeline_args("ci", Path::new("/tmp/release.yaml"), "release");
        assert_eq!(
            args,
            vec![
                "-t",
                "ci",
                "set-pipeline",
                "-c",
                "/tmp/release.yaml",
                "-p",
                "release",
                "-n"
            ]
        );
    }
}
