//! Blocking subprocess helpers
//!
//! Used by resource handles (git), secret managers (vault) and the CLI (fly).
//! Every call blocks the process until the child exits.

use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Errors raised while running an external program
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started
    #[error("Failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully
    #[error("'{program}' failed with exit code {exit_code}: {stderr}")]
    Failed {
        program: String,
        exit_code: i32,
        stderr: String,
    },
}

/// Runs a program and returns its trimmed stdout
///
/// # Arguments
/// * `program` - Executable name or path
/// * `args` - Arguments passed verbatim
/// * `cwd` - Working directory (None = current directory)
///
/// # Errors
/// Returns an error if the program cannot be started or exits non-zero.
pub fn capture(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<String, CommandError> {
    debug!("Executing: {} {:?}", program, args);

    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command.output().map_err(|source| CommandError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(
            "Command failed: program={} exit_code={} stderr='{}'",
            program, exit_code, stderr
        );
        return Err(CommandError::Failed {
            program: program.to_string(),
            exit_code,
            stderr,
        });
    }

    debug!(
        "Command completed successfully: stdout_len={}, stderr_len={}",
        stdout.len(),
        stderr.len()
    );
    Ok(stdout)
}

/// Runs a program with inherited stdio, failing on a non-zero exit
pub fn run_inherited(program: &str, args: &[&str]) -> Result<(), CommandError> {
    debug!("Executing (inherited stdio): {} {:?}", program, args);

    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            exit_code: status.code().unwrap_or(-1),
            stderr: String::new(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_spawn_error() {
        let result = capture("sluice-definitely-not-a-program", &[], None);
        assert!(matches!(result, Err(CommandError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_trims_stdout() {
        let out = capture("sh", &["-c", "echo '  hello  '"], None).unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_reports_stderr() {
        let err = capture("sh", &["-c", "echo boom >&2; exit 3"], None).unwrap_err();
        match err {
            CommandError::Failed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
