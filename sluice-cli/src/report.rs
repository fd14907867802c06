//! Error report printed before a pipeline binary exits with a failure

use colored::*;
use sluice_engine::{CallSite, PipelineError};
use std::io::{self, Write};

/// Writes the error, its causes and the authoring call site, when known
pub fn write_report(out: &mut impl Write, err: &anyhow::Error) -> io::Result<()> {
    writeln!(out, "{} {}", "Error:".red().bold(), err.to_string().red())?;
    for cause in err.chain().skip(1) {
        writeln!(out, "  {} {}", "caused by:".dimmed(), cause)?;
    }
    if let Some(location) = call_site(err) {
        writeln!(
            out,
            "  {}",
            format!(
                "at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            )
            .bold()
        )?;
    }
    Ok(())
}

fn call_site(err: &anyhow::Error) -> Option<CallSite> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<PipelineError>())
        .find_map(PipelineError::location)
}
