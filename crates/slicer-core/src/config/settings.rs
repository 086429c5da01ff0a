//! `slicer.toml` parsing and default layering

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use slicer_schema::{BoundField, BoundsOverrides};

use super::builtin_defaults;
use crate::{Error, Result};

fn default_true() -> bool {
    true
}

fn default_definition_dir() -> PathBuf {
    PathBuf::from("definitions")
}

fn default_printer_definition() -> String {
    "creality_ender3".to_string()
}

fn default_engine_path() -> PathBuf {
    PathBuf::from("/usr/bin/CuraEngine")
}

fn default_archive_directory() -> PathBuf {
    PathBuf::from("archive")
}

fn default_user_settings() -> PathBuf {
    PathBuf::from("user_settings.json")
}

fn default_starred_settings() -> PathBuf {
    PathBuf::from("starred_settings.json")
}

fn default_starred_defaults() -> PathBuf {
    PathBuf::from("starred_settings.default.json")
}

/// `[paths]` section: where the engine finds its inputs and state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding `*.def.json` printer definitions
    #[serde(default = "default_definition_dir")]
    pub definition_dir: PathBuf,

    /// Most specific definition in the inheritance chain, without suffix
    #[serde(default = "default_printer_definition")]
    pub printer_definition: String,

    /// Slicing engine binary
    #[serde(default = "default_engine_path")]
    pub engine_path: PathBuf,

    /// Where finished jobs are archived
    #[serde(default = "default_archive_directory")]
    pub archive_directory: PathBuf,

    /// Per-user override store
    #[serde(default = "default_user_settings")]
    pub user_settings: PathBuf,

    /// Runtime list of starred setting keys
    #[serde(default = "default_starred_settings")]
    pub starred_settings: PathBuf,

    /// Checked-in fallback for `starred_settings`
    #[serde(default = "default_starred_defaults")]
    pub starred_defaults: PathBuf,

    /// Optional custom presets file
    #[serde(default)]
    pub presets: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            definition_dir: default_definition_dir(),
            printer_definition: default_printer_definition(),
            engine_path: default_engine_path(),
            archive_directory: default_archive_directory(),
            user_settings: default_user_settings(),
            starred_settings: default_starred_settings(),
            starred_defaults: default_starred_defaults(),
            presets: None,
        }
    }
}

impl PathsConfig {
    /// Make every relative path relative to `base` instead of the process cwd.
    fn anchor(&mut self, base: &Path) {
        let join = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        join(&mut self.definition_dir);
        join(&mut self.archive_directory);
        join(&mut self.user_settings);
        join(&mut self.starred_settings);
        join(&mut self.starred_defaults);
        if let Some(presets) = self.presets.as_mut() {
            join(presets);
        }
    }
}

/// Accept `"0.2"`, `0.2`, `15` or `true` for a value sent as text.
fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<toml::Value>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s)),
        Some(toml::Value::Integer(n)) => Ok(Some(n.to_string())),
        Some(toml::Value::Float(x)) => Ok(Some(x.to_string())),
        Some(toml::Value::Boolean(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a scalar default_value, found {}",
            other.type_str()
        ))),
    }
}

/// One `[defaults.<key>]` table.
///
/// Every field is optional so layers merge field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingDefaults {
    /// Value sent to the engine unless a user overrides it
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    /// Always emit, even when equal to the definition default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_value_warning: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_value_warning: Option<f64>,
}

impl SettingDefaults {
    /// Overlay `other`; its set fields win.
    pub fn merge(&mut self, other: &SettingDefaults) {
        if other.default_value.is_some() {
            self.default_value.clone_from(&other.default_value);
        }
        if other.forced.is_some() {
            self.forced = other.forced;
        }
        for field in BoundField::ALL {
            if let Some(value) = other.bound(field) {
                self.set_bound(field, value);
            }
        }
    }

    pub fn bound(&self, field: BoundField) -> Option<f64> {
        match field {
            BoundField::Minimum => self.minimum_value,
            BoundField::Maximum => self.maximum_value,
            BoundField::MinimumWarning => self.minimum_value_warning,
            BoundField::MaximumWarning => self.maximum_value_warning,
        }
    }

    fn set_bound(&mut self, field: BoundField, value: f64) {
        let slot = match field {
            BoundField::Minimum => &mut self.minimum_value,
            BoundField::Maximum => &mut self.maximum_value,
            BoundField::MinimumWarning => &mut self.minimum_value_warning,
            BoundField::MaximumWarning => &mut self.maximum_value_warning,
        };
        *slot = Some(value);
    }
}

/// Parsed `slicer.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlicerConfig {
    /// Layer the checked-in printer defaults under `[defaults]`
    #[serde(default = "default_true")]
    pub use_builtin_defaults: bool,

    #[serde(default)]
    pub paths: PathsConfig,

    /// Per-setting defaults from the file, before layering
    #[serde(default)]
    pub defaults: BTreeMap<String, SettingDefaults>,

    /// Dotted `key.bound_field = number` entries
    #[serde(default)]
    pub bounds_overrides: BTreeMap<String, f64>,
}

impl Default for SlicerConfig {
    fn default() -> Self {
        Self {
            use_builtin_defaults: true,
            paths: PathsConfig::default(),
            defaults: BTreeMap::new(),
            bounds_overrides: BTreeMap::new(),
        }
    }
}

impl SlicerConfig {
    /// Parse configuration text. Relative paths are left as written.
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `path`, anchoring relative paths at the file's directory.
    ///
    /// # Errors
    ///
    /// `ConfigNotFound` when the file is missing, `InvalidConfig` when it is
    /// not valid TOML or has the wrong shape.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!(?path, "Loading slicer config");
        let content = slicer_fs::io::read_text(path)?;
        let mut config = Self::parse(&content).map_err(|e| Error::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(base) = path.parent() {
            config.paths.anchor(base);
        }
        Ok(config)
    }

    /// Built-in defaults with the file's `[defaults]` merged per key.
    pub fn layered_defaults(&self) -> BTreeMap<String, SettingDefaults> {
        let mut merged = if self.use_builtin_defaults {
            builtin_defaults()
        } else {
            BTreeMap::new()
        };
        for (key, entry) in &self.defaults {
            merged.entry(key.clone()).or_default().merge(entry);
        }
        merged
    }

    /// `key -> default_value` handed to every resolution.
    pub fn config_defaults(&self) -> BTreeMap<String, String> {
        self.layered_defaults()
            .into_iter()
            .filter_map(|(key, entry)| entry.default_value.map(|value| (key, value)))
            .collect()
    }

    /// Keys emitted even when they equal the definition default.
    pub fn forced_keys(&self) -> BTreeSet<String> {
        self.layered_defaults()
            .into_iter()
            .filter(|(_, entry)| entry.forced == Some(true))
            .map(|(key, _)| key)
            .collect()
    }

    /// Bound overrides from `[defaults]`, then `[bounds_overrides]` on top.
    pub fn bounds(&self) -> BoundsOverrides {
        let mut bounds = BoundsOverrides::new();
        for (key, entry) in self.layered_defaults() {
            for field in BoundField::ALL {
                if let Some(value) = entry.bound(field) {
                    bounds.insert(key.clone(), field.field_name(), value);
                }
            }
        }
        for (entry, value) in &self.bounds_overrides {
            bounds.insert_dotted(entry, *value);
        }
        bounds
    }
}
