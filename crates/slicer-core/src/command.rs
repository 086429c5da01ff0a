//! Slicing-engine command line and mesh scale factors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Settings consumed by mesh scaling; never passed to the slicing engine.
pub const SCALE_KEYS: [&str; 4] = ["scale", "scale_x", "scale_y", "scale_z"];

/// Percentage meaning "unchanged".
const UNSCALED: f64 = 100.0;

/// Argument vector for one slicing run.
///
/// Building a command never spawns anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    args: Vec<String>,
}

impl EngineCommand {
    /// `engine slice -d <defs> -d <defs>/../extruders -j <printer> (-s k=v)... -l <mesh> -o <output>`
    pub fn build(
        engine: &Path,
        definition_dir: &Path,
        printer_definition: &str,
        mesh: &Path,
        output: &Path,
        emitted: &BTreeMap<String, String>,
    ) -> Self {
        let extruders_dir = definition_dir
            .parent()
            .map(|parent| parent.join("extruders"))
            .unwrap_or_else(|| PathBuf::from("extruders"));

        let mut args = vec![
            engine.display().to_string(),
            "slice".to_string(),
            "-d".to_string(),
            definition_dir.display().to_string(),
            "-d".to_string(),
            extruders_dir.display().to_string(),
            "-j".to_string(),
            printer_definition.to_string(),
        ];
        for (key, value) in emitted {
            args.push("-s".to_string());
            args.push(format!("{key}={value}"));
        }
        args.extend([
            "-l".to_string(),
            mesh.display().to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ]);
        Self { args }
    }

    /// The binary to run.
    pub fn program(&self) -> &str {
        &self.args[0]
    }

    /// Arguments after the binary.
    pub fn args(&self) -> &[String] {
        &self.args[1..]
    }

    /// Full argument vector including the binary.
    pub fn argv(&self) -> &[String] {
        &self.args
    }
}

impl std::fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

/// Per-axis mesh scale, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ScaleFactors {
    /// Whether any axis differs from 100%.
    pub fn needs_scaling(&self) -> bool {
        [self.x, self.y, self.z].iter().any(|axis| *axis != UNSCALED)
    }
}

/// Resolve master and per-axis scale from config defaults and overrides.
///
/// Overrides win over config defaults. Each axis falls back to the master
/// `scale`, which falls back to 100. Values that do not parse as numbers
/// are treated as absent.
pub fn resolve_scale(
    config_defaults: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> ScaleFactors {
    let lookup = |key: &str| -> Option<f64> {
        let raw = overrides.get(key).or_else(|| config_defaults.get(key))?;
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                tracing::warn!(key, value = %raw, "Ignoring non-numeric scale");
                None
            }
        }
    };
    let master = lookup("scale").unwrap_or(UNSCALED);
    ScaleFactors {
        x: lookup("scale_x").unwrap_or(master),
        y: lookup("scale_y").unwrap_or(master),
        z: lookup("scale_z").unwrap_or(master),
    }
}
