//! [`TestWorkspace`] for engine and CLI scenarios.

use crate::definitions::{DefinitionDir, FIXTURE_PRINTER};
use std::fs;
use std::path::{Path, PathBuf};

/// Fixture definitions plus a `slicer.toml` pointing at them.
///
/// # Example
///
/// ```rust,no_run
/// use slicer_test_utils::TestWorkspace;
///
/// let ws = TestWorkspace::new();
/// ws.write_config("[defaults.layer_height]\ndefault_value = \"0.2\"\n");
/// assert!(ws.config_path().exists());
/// ```
pub struct TestWorkspace {
    definitions: DefinitionDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// A workspace holding the checked-in fixture chain.
    pub fn new() -> Self {
        Self {
            definitions: DefinitionDir::with_fixture_chain(),
        }
    }

    pub fn root(&self) -> &Path {
        self.definitions.path()
    }

    pub fn definitions(&self) -> &DefinitionDir {
        &self.definitions
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("slicer.toml")
    }

    /// Write `slicer.toml` with a `[paths]` table for this workspace plus `extra`.
    pub fn write_config(&self, extra: &str) -> PathBuf {
        self.write_config_with("", extra)
    }

    /// Like [`write_config`](Self::write_config) with the built-in printer
    /// defaults switched off, so only the definitions and `extra` apply.
    pub fn write_bare_config(&self, extra: &str) -> PathBuf {
        self.write_config_with("use_builtin_defaults = false\n", extra)
    }

    fn write_config_with(&self, top_level: &str, extra: &str) -> PathBuf {
        let root = self.root().display().to_string().replace('\\', "/");
        let config = format!(
            "{top_level}[paths]\n\
             definition_dir = \"{root}\"\n\
             printer_definition = \"{FIXTURE_PRINTER}\"\n\
             engine_path = \"/usr/bin/CuraEngine\"\n\
             archive_directory = \"{root}/archive\"\n\
             user_settings = \"{root}/user_settings.json\"\n\
             starred_settings = \"{root}/starred_settings.json\"\n\
             starred_defaults = \"{root}/starred_settings.default.json\"\n\
             presets = \"{root}/presets.json\"\n\n\
             {extra}"
        );
        let path = self.config_path();
        fs::write(&path, config).unwrap();
        path
    }

    /// Write an arbitrary file relative to the workspace root.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}
