//! Named bundles of setting overrides.
//!
//! Built-in presets cover common quality levels and filaments. An operator
//! may add more, or replace a built-in, through a JSON file of the form:
//!
//! ```json
//! {
//!   "silk": {
//!     "description": "Shiny silk PLA",
//!     "settings": { "material_print_temperature": "215", "speed_print": "40" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use slicer_schema::{AttributeTable, validate};

use crate::{Error, Result};

/// One named preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl Preset {
    fn new(description: &str, settings: &[(&str, &str)]) -> Self {
        Self {
            description: description.to_string(),
            settings: settings
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Whether every preset value appears verbatim in `overrides`.
    pub fn is_applied_in(&self, overrides: &BTreeMap<String, String>) -> bool {
        !self.settings.is_empty()
            && self
                .settings
                .iter()
                .all(|(key, value)| overrides.get(key) == Some(value))
    }
}

/// Values a preset contributes after validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppliedPreset {
    /// Normalized values to merge into the user's overrides
    pub accepted: BTreeMap<String, String>,
    /// Rejection message per key
    pub rejected: BTreeMap<String, String>,
    /// Soft-bound warning per key
    pub warnings: BTreeMap<String, String>,
}

fn builtin_presets() -> Vec<(&'static str, Preset)> {
    vec![
        (
            "draft",
            Preset::new(
                "Fast printing, lower quality",
                &[
                    ("layer_height", "0.3"),
                    ("infill_sparse_density", "10"),
                    ("wall_line_count", "2"),
                    ("top_layers", "3"),
                    ("bottom_layers", "3"),
                    ("speed_print", "80"),
                ],
            ),
        ),
        (
            "standard",
            Preset::new(
                "Balanced quality and speed",
                &[
                    ("layer_height", "0.2"),
                    ("infill_sparse_density", "20"),
                    ("wall_line_count", "3"),
                    ("top_layers", "4"),
                    ("bottom_layers", "4"),
                    ("speed_print", "60"),
                ],
            ),
        ),
        (
            "fine",
            Preset::new(
                "High quality, slower printing",
                &[
                    ("layer_height", "0.12"),
                    ("infill_sparse_density", "20"),
                    ("wall_line_count", "3"),
                    ("top_layers", "5"),
                    ("bottom_layers", "5"),
                    ("speed_print", "40"),
                ],
            ),
        ),
        (
            "strong",
            Preset::new(
                "Maximum strength for functional parts",
                &[
                    ("layer_height", "0.2"),
                    ("infill_sparse_density", "60"),
                    ("wall_line_count", "4"),
                    ("top_layers", "6"),
                    ("bottom_layers", "6"),
                    ("speed_print", "50"),
                ],
            ),
        ),
        (
            "PLA",
            Preset::new(
                "Temperatures and settings for PLA filament",
                &[
                    ("material_print_temperature", "220"),
                    ("material_bed_temperature", "60"),
                    ("cool_fan_speed", "100"),
                    ("cool_fan_speed_min", "100"),
                    ("cool_fan_speed_max", "100"),
                    ("speed_print", "60"),
                ],
            ),
        ),
        (
            "PETG",
            Preset::new(
                "Temperatures and settings for PETG filament",
                &[
                    ("material_print_temperature", "235"),
                    ("material_bed_temperature", "75"),
                    ("cool_fan_speed", "50"),
                    ("cool_fan_speed_min", "50"),
                    ("cool_fan_speed_max", "50"),
                    ("speed_print", "45"),
                ],
            ),
        ),
    ]
}

/// Built-in presets plus the operator's custom ones.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetManager {
    presets: BTreeMap<String, Preset>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-in presets only.
    pub fn new() -> Self {
        let presets = builtin_presets()
            .into_iter()
            .map(|(name, preset)| (name.to_string(), preset))
            .collect();
        Self { presets }
    }

    /// Built-ins with the presets in `path` layered on top.
    ///
    /// A missing file is not an error. A custom preset replaces a built-in
    /// with the same name, compared case-insensitively.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut manager = Self::new();
        let Some(path) = path.filter(|p| p.is_file()) else {
            return Ok(manager);
        };
        let content = slicer_fs::io::read_text(path)?;
        let custom: BTreeMap<String, Preset> =
            serde_json::from_str(&content).map_err(|e| Error::InvalidPresets {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        tracing::debug!(?path, count = custom.len(), "Loaded custom presets");
        for (name, preset) in custom {
            manager.insert(name, preset);
        }
        Ok(manager)
    }

    /// Add or replace a preset.
    pub fn insert(&mut self, name: String, preset: Preset) {
        let existing = self
            .presets
            .keys()
            .find(|known| known.eq_ignore_ascii_case(&name))
            .cloned();
        if let Some(existing) = existing {
            self.presets.remove(&existing);
        }
        self.presets.insert(name, preset);
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, preset)| preset)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Preset)> {
        self.presets.iter().map(|(name, preset)| (name.as_str(), preset))
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Presets whose every value is already present in `overrides`.
    pub fn matching_presets(&self, overrides: &BTreeMap<String, String>) -> Vec<&str> {
        self.iter()
            .filter(|(_, preset)| preset.is_applied_in(overrides))
            .map(|(name, _)| name)
            .collect()
    }

    /// Validate the named preset's values against `table`.
    ///
    /// # Errors
    ///
    /// `PresetNotFound` when no preset has that name.
    pub fn apply(&self, name: &str, table: &AttributeTable) -> Result<AppliedPreset> {
        let preset = self.get(name).ok_or_else(|| Error::PresetNotFound {
            name: name.to_string(),
        })?;
        let mut applied = AppliedPreset::default();
        for (key, raw) in &preset.settings {
            let Some(attr) = table.get(key) else {
                tracing::debug!(preset = name, key = %key, "Preset names an unknown setting");
                applied.accepted.insert(key.clone(), raw.clone());
                continue;
            };
            let outcome = validate(attr, raw);
            if outcome.accepted {
                if let Some(warning) = outcome.warning {
                    applied.warnings.insert(key.clone(), warning);
                }
                applied.accepted.insert(key.clone(), outcome.normalized_value);
            } else {
                applied
                    .rejected
                    .insert(key.clone(), outcome.error.unwrap_or_default());
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use slicer_expr::Value;
    use slicer_schema::{AttributeDefinition, ValueType};
    use tempfile::TempDir;

    fn overrides(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builtins_are_available_case_insensitively() {
        let manager = PresetManager::new();
        assert_eq!(manager.len(), 6);
        assert!(manager.get("DRAFT").is_some());
        assert!(manager.get("petg").is_some());
        assert!(manager.get("unknown").is_none());
    }

    #[test]
    fn matching_requires_every_value() {
        let manager = PresetManager::new();
        let fine = manager.get("fine").unwrap().settings.clone();
        assert_eq!(manager.matching_presets(&fine), vec!["fine"]);

        let mut partial = fine.clone();
        partial.insert("speed_print".into(), "41".into());
        assert!(manager.matching_presets(&partial).is_empty());

        let pla_and_more = overrides(&[
            ("material_print_temperature", "220"),
            ("material_bed_temperature", "60"),
            ("cool_fan_speed", "100"),
            ("cool_fan_speed_min", "100"),
            ("cool_fan_speed_max", "100"),
            ("speed_print", "60"),
            ("layer_height", "0.2"),
        ]);
        assert_eq!(manager.matching_presets(&pla_and_more), vec!["PLA"]);
    }

    #[test]
    fn custom_file_replaces_builtin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("presets.json");
        std::fs::write(
            &path,
            r#"{"Draft": {"description": "Custom draft", "settings": {"layer_height": "0.28"}},
                "silk": {"settings": {"speed_print": "40"}}}"#,
        )
        .unwrap();

        let manager = PresetManager::load(Some(&path)).unwrap();
        assert_eq!(manager.len(), 7);
        assert_eq!(manager.get("draft").unwrap().description, "Custom draft");
        assert_eq!(manager.get("silk").unwrap().description, "");
        assert!(manager.names().any(|n| n == "Draft"));
    }

    #[test]
    fn missing_file_means_builtins_only() {
        let dir = TempDir::new().unwrap();
        let manager = PresetManager::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(manager, PresetManager::new());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("presets.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let err = PresetManager::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::InvalidPresets { .. }));
    }

    #[test]
    fn apply_validates_each_value() {
        let table = AttributeTable::new([
            AttributeDefinition::new("layer_height", ValueType::Float, Value::Float(0.2))
                .with_bounds(Some(0.001), Some(0.25)),
            AttributeDefinition::new("wall_line_count", ValueType::Int, Value::Int(2)),
        ]);
        let applied = PresetManager::new().apply("draft", &table).unwrap();

        assert!(applied.rejected.contains_key("layer_height"));
        assert_eq!(applied.accepted.get("wall_line_count").map(String::as_str), Some("2"));
        // Unknown to the table, passed through
        assert_eq!(applied.accepted.get("speed_print").map(String::as_str), Some("80"));
    }

    #[test]
    fn apply_unknown_preset_fails() {
        let table = AttributeTable::new(Vec::<AttributeDefinition>::new());
        let err = PresetManager::new().apply("nope", &table).unwrap_err();
        assert!(matches!(err, Error::PresetNotFound { .. }));
    }
}
