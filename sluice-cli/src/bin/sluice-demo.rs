//! Demo pipeline
//!
//! `sluice-demo` runs it locally, `sluice-demo --dump` prints its document.

use sluice_engine::{GetOptions, Pipeline, Secret};
use sluice_resources::GitRepo;
use std::process::ExitCode;

fn main() -> ExitCode {
    sluice_cli::main_with(|settings| {
        let mut pipeline = Pipeline::builder("sluice-demo", settings);
        pipeline.resource("shalm", GitRepo::new("https://github.com/kramerul/shalm"))?;

        let mut job = pipeline.job("create_cluster")?;
        let shalm = job.get_with("shalm", GetOptions::trigger())?;
        let cluster_name = "xxx";

        let create_shoot = job.task("create_shoot").run(move |_| {
            println!("Create cluster {}", cluster_name);
            Ok(cluster_name.to_string())
        })?;

        job.task("install_shalm")
            .secret("home", Secret::required("HOME"))
            .run(move |args| {
                println!("HOME={}", args.secret("home")?);
                println!(
                    "Installing shalm {} into {}",
                    shalm.path().map(|p| p.display().to_string()).unwrap_or_default(),
                    create_shoot.call()?
                );
                Ok("Hello".to_string())
            })?;

        pipeline.job("test_cluster")?.get("shalm")?;
        Ok(pipeline.build())
    })
}
