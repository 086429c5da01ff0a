//! Validate command implementation

use colored::Colorize;

use crate::context::SlicerContext;
use crate::error::{CliError, Result};

/// Run the validate command
///
/// Exits non-zero when the value is rejected.
pub fn run_validate(ctx: &SlicerContext, query: &str, raw: &str) -> Result<()> {
    let found = ctx.engine.find(query);
    let Some(key) = found.key else {
        let mut message = format!("Unknown setting '{query}'");
        if !found.candidates.is_empty() {
            let names: Vec<&str> = found.candidates.iter().map(|a| a.key.as_str()).collect();
            message.push_str(&format!(". Did you mean: {}?", names.join(", ")));
        }
        return Err(CliError::user(message));
    };

    let outcome = ctx
        .engine
        .validate(key, raw)
        .ok_or_else(|| CliError::user(format!("Unknown setting '{key}'")))?;

    if !outcome.accepted {
        return Err(CliError::user(format!(
            "{key}: {}",
            outcome.error.unwrap_or_default()
        )));
    }

    println!("{} {} = {}", "ok".green().bold(), key.cyan(), outcome.normalized_value);
    if let Some(warning) = outcome.warning {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
    Ok(())
}
