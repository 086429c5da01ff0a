//! Deps command implementation

use colored::Colorize;

use crate::context::SlicerContext;
use crate::error::{CliError, Result};

/// Run the deps command
pub fn run_deps(ctx: &SlicerContext, key: &str) -> Result<()> {
    let engine = &ctx.engine;
    if !engine.table().contains(key) {
        return Err(CliError::user(format!("Unknown setting '{key}'")));
    }
    let graph = engine.graph();

    println!("{}", key.bold());
    print_list("Reads", &graph.dependencies_of(key));
    print_list("Read by", &graph.dependents_of(key));

    if graph.cyclic_keys().iter().any(|k| k == key) {
        println!("{} part of a dependency cycle", "warning:".yellow().bold());
    }
    Ok(())
}

fn print_list(title: &str, keys: &[&str]) {
    println!("{}:", title.dimmed());
    if keys.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for key in keys {
        println!("  {}", key.cyan());
    }
}
