//! Command implementations for slicer-cli

pub mod command;
pub mod deps;
pub mod find;
pub mod presets;
pub mod resolve;
pub mod validate;

pub use command::run_command;
pub use deps::run_deps;
pub use find::run_find;
pub use presets::run_presets;
pub use resolve::run_resolve;
pub use validate::run_validate;

use slicer_core::Resolution;

use crate::error::{CliError, Result};

/// Fail when placeholders survived expansion; the slicing engine would
/// choke on them.
pub(crate) fn ensure_ready(resolution: &Resolution) -> Result<()> {
    if resolution.is_ready() {
        return Ok(());
    }
    let detail: Vec<String> = resolution
        .unknown_tokens
        .iter()
        .map(|(key, tokens)| format!("{key}: {{{}}}", tokens.join("}, {")))
        .collect();
    Err(CliError::user(format!(
        "Unresolved G-code placeholders ({})",
        detail.join("; ")
    )))
}
