//! Presets command implementation

use colored::Colorize;

use crate::context::SlicerContext;
use crate::error::Result;

/// Run the presets command
pub fn run_presets(ctx: &SlicerContext) -> Result<()> {
    let manager = ctx.presets()?;

    println!("{}", "Available Presets".bold());
    println!();
    for (name, preset) in manager.iter() {
        println!("  {:<12} {}", name.green(), preset.description.dimmed());
        for (key, value) in &preset.settings {
            println!("    {} = {}", key.cyan(), value);
        }
    }
    println!();
    println!(
        "{} {} presets available. Use {} to apply one.",
        "Total:".dimmed(),
        manager.len(),
        "slicer resolve --preset <name>".cyan()
    );
    Ok(())
}
