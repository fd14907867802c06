//! Sluice CLI
//!
//! Entry point of a pipeline binary. A pipeline is an ordinary Rust program
//! whose `main` hands a build function to [`main_with`]:
//!
//! ```no_run
//! use sluice_engine::Pipeline;
//!
//! fn main() -> std::process::ExitCode {
//!     sluice_cli::main_with(|settings| {
//!         let mut builder = Pipeline::builder("hello", settings);
//!         builder
//!             .job("greet")?
//!             .task("say_hello")
//!             .run(|_| Ok("hello".to_string()))?;
//!         Ok(builder.build())
//!     })
//! }
//! ```
//!
//! The same binary runs the pipeline locally, prints or uploads its document,
//! and serves as the entrypoint of every task container.

mod cli;
mod commands;
mod report;

pub use cli::Cli;
pub use commands::{Command, handle_command};
pub use report::write_report;

use anyhow::{Context, Result};
use clap::Parser;
use sluice_engine::{Pipeline, Settings};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parses the command line, builds the pipeline and runs the selected command
///
/// Errors are reported on stderr and turn into exit code 1.
pub fn main_with<F>(build: F) -> ExitCode
where
    F: FnOnce(Settings) -> Result<Pipeline>,
{
    init_tracing();
    let cli = Cli::parse();

    match execute(&cli, build) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Nothing sensible is left to do if stderr itself fails
            let _ = write_report(&mut std::io::stderr(), &err);
            ExitCode::FAILURE
        }
    }
}

fn execute<F>(cli: &Cli, build: F) -> Result<()>
where
    F: FnOnce(Settings) -> Result<Pipeline>,
{
    let settings = cli.apply(Settings::from_env()?);
    settings.validate().context("Invalid settings")?;

    let pipeline = build(settings)?;
    handle_command(cli.command(), &pipeline)
}

/// Logs go to stderr so task results and documents on stdout stay parseable
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sluice_engine=info,sluice_cli=info,sluice_resources=info,sluice_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
