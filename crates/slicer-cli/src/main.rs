//! Auto-slicer CLI
//!
//! Operator front end for the settings resolution engine.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::SlicerContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(&cli.config, cmd),
        None => {
            // No command provided - show help hint
            println!("{} Auto-slicer settings engine", "slicer".green().bold());
            println!();
            println!("Run {} for available commands.", "slicer --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(config: &std::path::Path, cmd: Commands) -> Result<()> {
    let ctx = SlicerContext::load(config)?;
    match cmd {
        Commands::Resolve {
            set,
            preset,
            user,
            json,
        } => commands::run_resolve(&ctx, user, &preset, &set, json),
        Commands::Validate { key, value } => commands::run_validate(&ctx, &key, &value),
        Commands::Find { query } => commands::run_find(&ctx, &query),
        Commands::Deps { key } => commands::run_deps(&ctx, &key),
        Commands::Presets => commands::run_presets(&ctx),
        Commands::Command { mesh, output, set } => commands::run_command(&ctx, &mesh, &output, &set),
    }
}
