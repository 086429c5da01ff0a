//! Operator configuration
//!
//! The operator configuration is a single TOML file (`slicer.toml`) holding
//! machine paths, per-setting defaults and bound overrides. Setting defaults
//! are layered, later layers overriding earlier ones field by field:
//!
//! 1. **Built-in printer defaults** - [`builtin_defaults`]
//! 2. **`[defaults.<key>]` tables** - from the configuration file
//! 3. **`[bounds_overrides]`** - dotted `key.bound_field = number` entries
//!
//! # Example
//!
//! ```
//! use slicer_core::config::SlicerConfig;
//!
//! let config = SlicerConfig::parse(r#"
//! use_builtin_defaults = false
//!
//! [paths]
//! printer_definition = "creality_ender3"
//!
//! [defaults.roofing_layer_count]
//! default_value = "0"
//! forced = true
//! "#).unwrap();
//!
//! assert_eq!(config.config_defaults()["roofing_layer_count"], "0");
//! assert!(config.forced_keys().contains("roofing_layer_count"));
//! ```

mod builtin;
mod settings;

pub use builtin::builtin_defaults;
pub use settings::{PathsConfig, SettingDefaults, SlicerConfig};
