//! Resolve command implementation

use std::collections::BTreeMap;

use colored::Colorize;
use slicer_core::{Resolution, ResolveRequest, UserId};

use super::ensure_ready;
use crate::context::SlicerContext;
use crate::error::Result;

/// Run the resolve command
pub fn run_resolve(
    ctx: &SlicerContext,
    user: Option<UserId>,
    presets: &[String],
    set: &[(String, String)],
    json: bool,
) -> Result<()> {
    let overrides = ctx.collect_overrides(user, presets, set)?;
    let request = ResolveRequest::from_config(&ctx.config, overrides);
    let resolution = ctx.engine.resolve(&request);

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        print_resolution(&resolution);
    }

    ensure_ready(&resolution)
}

fn print_resolution(resolution: &Resolution) {
    println!(
        "{} ({} settings)",
        "Resolved Settings".bold(),
        resolution.emitted.len()
    );
    println!();
    for (key, value) in &resolution.emitted {
        if value.contains('\n') {
            println!("  {}:", key.cyan());
            for line in value.lines() {
                println!("    {}", line.dimmed());
            }
        } else {
            println!("  {:<40} {}", key.cyan(), value);
        }
    }

    print_section("Warnings", &resolution.warnings, |s| s.yellow().to_string());
    print_section("Rejected", &resolution.rejected, |s| s.red().to_string());
    print_section("Formula errors", resolution.errors(), |s| s.red().to_string());

    if !resolution.unknown_tokens.is_empty() {
        println!();
        println!("{}:", "Unknown placeholders".red().bold());
        for (key, tokens) in &resolution.unknown_tokens {
            println!("  {} {}", key.cyan(), tokens.join(", ").red());
        }
    }
}

fn print_section(title: &str, entries: &BTreeMap<String, String>, paint: impl Fn(&str) -> String) {
    if entries.is_empty() {
        return;
    }
    println!();
    println!("{}:", title.bold());
    for (key, message) in entries {
        println!("  {} {}", key.cyan(), paint(message));
    }
}
