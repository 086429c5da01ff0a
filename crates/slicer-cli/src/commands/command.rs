//! Command command implementation: the slicing-engine invocation

use std::path::Path;

use colored::Colorize;
use slicer_core::{EngineCommand, ResolveRequest, resolve_scale};

use super::ensure_ready;
use crate::context::SlicerContext;
use crate::error::Result;

/// Run the command command
///
/// Prints the program, then one argument per line. Arguments holding
/// whitespace are printed quoted and escaped.
pub fn run_command(ctx: &SlicerContext, mesh: &Path, output: &Path, set: &[(String, String)]) -> Result<()> {
    let overrides = ctx.collect_overrides(None, &[], set)?;
    let request = ResolveRequest::from_config(&ctx.config, overrides);
    let resolution = ctx.engine.resolve(&request);

    for (key, reason) in &resolution.rejected {
        eprintln!("{} {} rejected: {}", "warning:".yellow().bold(), key.cyan(), reason);
    }
    ensure_ready(&resolution)?;

    let scale = resolve_scale(&request.config_defaults, &request.overrides);
    if scale.needs_scaling() {
        eprintln!(
            "{} mesh must be scaled to {}% x {}% x {}% first",
            "note:".cyan().bold(),
            scale.x,
            scale.y,
            scale.z
        );
    }

    let paths = &ctx.config.paths;
    let command = EngineCommand::build(
        &paths.engine_path,
        &paths.definition_dir,
        &paths.printer_definition,
        mesh,
        output,
        &resolution.emitted,
    );
    tracing::debug!(args = command.argv().len(), "Built slicing command");

    println!("{}", command.program());
    for arg in command.args() {
        if arg.contains(char::is_whitespace) {
            println!("  {arg:?}");
        } else {
            println!("  {arg}");
        }
    }
    Ok(())
}
