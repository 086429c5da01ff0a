//! Loaded operator state shared by the commands.
//!
//! Every command starts from the same place: read `slicer.toml`, load the
//! printer definition chain it names, and build the settings engine.

use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;
use slicer_core::{PresetManager, SettingsEngine, SlicerConfig, UserId, UserSettingsStore};

use crate::error::Result;

/// Configuration plus the engine built from it.
#[derive(Debug)]
pub struct SlicerContext {
    pub config: SlicerConfig,
    pub engine: SettingsEngine,
}

impl SlicerContext {
    /// Load the config at `path` and the definitions it points to.
    pub fn load(path: &Path) -> Result<Self> {
        let config = SlicerConfig::load(path)?;
        let engine = SettingsEngine::from_config(&config)?;
        tracing::debug!(
            printer = %config.paths.printer_definition,
            settings = engine.table().len(),
            "Loaded settings engine"
        );
        Ok(Self { config, engine })
    }

    /// Built-in presets plus the operator's preset file, if any.
    pub fn presets(&self) -> Result<PresetManager> {
        Ok(PresetManager::load(self.config.paths.presets.as_deref())?)
    }

    /// Merge the override layers of one request.
    ///
    /// Stored user overrides first, then each preset in order, then the
    /// explicit `set` pairs. Preset values that fail validation are reported
    /// on stderr and skipped.
    pub fn collect_overrides(
        &self,
        user: Option<UserId>,
        presets: &[String],
        set: &[(String, String)],
    ) -> Result<BTreeMap<String, String>> {
        let mut overrides = match user {
            Some(id) => UserSettingsStore::load(&self.config.paths.user_settings)?.overrides(id),
            None => BTreeMap::new(),
        };

        if !presets.is_empty() {
            let manager = self.presets()?;
            for name in presets {
                let applied = manager.apply(name, self.engine.table())?;
                for (key, reason) in &applied.rejected {
                    eprintln!(
                        "{} preset '{}' skips {}: {}",
                        "warning:".yellow().bold(),
                        name,
                        key.cyan(),
                        reason
                    );
                }
                overrides.extend(applied.accepted);
            }
        }

        overrides.extend(set.iter().cloned());
        Ok(overrides)
    }
}
