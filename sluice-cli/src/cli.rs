//! Command-line arguments of a pipeline binary

use clap::Parser;
use sluice_core::ExecutionContext;
use sluice_engine::{SecretSource, Settings};

use crate::commands::Command;

#[derive(Parser, Debug)]
#[command(about = "Run, dump or upload a Sluice pipeline", long_about = None)]
pub struct Cli {
    /// Run a single task through the cache and print its JSON result
    #[arg(
        long,
        num_args = 2,
        value_names = ["JOB", "TASK"],
        conflicts_with_all = ["dump", "target"]
    )]
    pub task: Option<Vec<String>>,

    /// Print the pipeline document as YAML
    #[arg(long, conflicts_with = "target")]
    pub dump: bool,

    /// Upload the pipeline document to the given fly target
    #[arg(long, value_name = "FLY_TARGET")]
    pub target: Option<String>,

    /// Run inside an orchestrator task container
    ///
    /// Also enabled through SLUICE_CONCOURSE, which is read with the rest
    /// of the settings.
    #[arg(long)]
    pub concourse: bool,

    /// Secret backend (env or vault)
    #[arg(long, env = "SLUICE_SECRET_MANAGER", default_value_t = SecretSource::Env)]
    pub secret_manager: SecretSource,
}

impl Cli {
    /// Applies the flags on top of settings read from the environment
    pub fn apply(&self, settings: Settings) -> Settings {
        let settings = settings.with_secret_source(self.secret_manager);
        if self.concourse {
            settings.with_context(ExecutionContext::Remote)
        } else {
            settings
        }
    }

    pub fn command(&self) -> Command {
        if let Some([job, task]) = self.task.as_deref() {
            return Command::RunTask {
                job: job.clone(),
                task: task.clone(),
            };
        }
        if self.dump {
            return Command::Dump;
        }
        if let Some(target) = &self.target {
            return Command::Upload {
                target: target.clone(),
            };
        }
        Command::Run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_runs_pipeline() {
        let cli = Cli::try_parse_from(["demo"]).unwrap();
        assert_eq!(cli.command(), Command::Run);
        assert_eq!(cli.secret_manager, SecretSource::Env);
    }

    #[test]
    fn test_task_takes_job_and_task() {
        let cli =
            Cli::try_parse_from(["demo", "--task", "build", "compile", "--concourse"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::RunTask {
                job: "build".to_string(),
                task: "compile".to_string(),
            }
        );
        assert!(cli.concourse);

        let settings = cli.apply(Settings::default());
        assert!(settings.context.is_remote());

        assert!(Cli::try_parse_from(["demo", "--task", "build"]).is_err());
    }

    #[test]
    fn test_dump_and_target() {
        let cli = Cli::try_parse_from(["demo", "--dump"]).unwrap();
        assert_eq!(cli.command(), Command::Dump);

        let cli = Cli::try_parse_from(["demo", "--target", "ci"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Upload {
                target: "ci".to_string()
            }
        );

        assert!(Cli::try_parse_from(["demo", "--dump", "--target", "ci"]).is_err());
    }

    #[test]
    fn test_context_from_environment_survives_parsing() {
        let cli = Cli::try_parse_from(["demo"]).unwrap();
        let remote = Settings::default().with_context(ExecutionContext::Remote);

        assert!(!cli.concourse);
        assert!(cli.apply(remote).context.is_remote());
        assert!(!cli.apply(Settings::default()).context.is_remote());
    }

    #[test]
    fn test_secret_manager_flag() {
        let cli = Cli::try_parse_from(["demo", "--secret-manager", "vault"]).unwrap();
        assert_eq!(cli.secret_manager, SecretSource::Vault);
        assert_eq!(
            cli.apply(Settings::default()).secret_source,
            SecretSource::Vault
        );

        assert!(Cli::try_parse_from(["demo", "--secret-manager", "keychain"]).is_err());
    }
}
