//! [`DefinitionDir`] builder for printer definition chains.

use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Most specific printer in the checked-in fixture chain.
pub const FIXTURE_PRINTER: &str = "creality_ender3";

/// Path to the checked-in `test-fixtures/definitions` directory.
pub fn fixtures_dir() -> PathBuf {
    // crates/slicer-test-utils -> ../../test-fixtures
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/definitions")
}

/// A temporary definitions directory.
///
/// # Example
///
/// ```rust,no_run
/// use slicer_test_utils::DefinitionDir;
/// use serde_json::json;
///
/// let defs = DefinitionDir::new();
/// defs.write_base("base", json!({
///     "layer_height": DefinitionDir::setting("float", json!(0.2)),
/// }));
/// defs.write_child("printer", "base", json!({ "layer_height": { "default_value": 0.3 } }));
/// ```
pub struct DefinitionDir {
    temp_dir: TempDir,
}

impl Default for DefinitionDir {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionDir {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// A directory pre-populated with the checked-in fixture chain.
    pub fn with_fixture_chain() -> Self {
        let dir = Self::new();
        for entry in fs::read_dir(fixtures_dir()).unwrap() {
            let path = entry.unwrap().path();
            if path.to_string_lossy().ends_with(".def.json") {
                fs::copy(&path, dir.path().join(path.file_name().unwrap())).unwrap();
            }
        }
        dir
    }

    /// Root of the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path a definition called `name` lives at.
    pub fn definition_path(&self, name: &str) -> PathBuf {
        self.path().join(format!("{name}.def.json"))
    }

    /// Write a raw document.
    pub fn write(&self, name: &str, document: &Value) -> PathBuf {
        let path = self.definition_path(name);
        fs::write(&path, serde_json::to_string_pretty(document).unwrap()).unwrap();
        path
    }

    /// Write raw text, e.g. to produce an unparsable document.
    pub fn write_raw(&self, name: &str, text: &str) -> PathBuf {
        let path = self.definition_path(name);
        fs::write(&path, text).unwrap();
        path
    }

    /// Write a base document whose `settings` tree is `settings`.
    pub fn write_base(&self, name: &str, settings: Value) -> PathBuf {
        self.write(name, &json!({ "name": name, "version": 2, "settings": settings }))
    }

    /// Write a child document inheriting `parent` with per-key `overrides`.
    pub fn write_child(&self, name: &str, parent: &str, overrides: Value) -> PathBuf {
        self.write(
            name,
            &json!({ "name": name, "version": 2, "inherits": parent, "overrides": overrides }),
        )
    }

    /// A leaf attribute node with a type and default.
    pub fn setting(value_type: &str, default: Value) -> Value {
        json!({ "type": value_type, "default_value": default })
    }

    /// A leaf attribute node with a computed value.
    pub fn computed(value_type: &str, default: Value, expression: &str) -> Value {
        json!({ "type": value_type, "default_value": default, "value": expression })
    }

    /// A category node wrapping `children`.
    pub fn category(label: &str, children: Value) -> Value {
        json!({ "type": "category", "label": label, "children": children })
    }
}
