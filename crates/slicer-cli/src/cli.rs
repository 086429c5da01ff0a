//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Auto-slicer - Resolve printer settings for the slicing engine
#[derive(Parser, Debug)]
#[command(name = "slicer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Operator configuration file
    #[arg(short, long, global = true, env = "SLICER_CONFIG", default_value = "slicer.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve the settings table handed to the slicing engine
    ///
    /// Layers, lowest first: definition defaults, config defaults, the
    /// user's stored overrides, presets in the order given, --set values.
    ///
    /// Examples:
    ///   slicer resolve
    ///   slicer resolve --preset fine --set infill_sparse_density=30
    ///   slicer resolve --user 42 --json
    Resolve {
        /// Override one setting (repeatable)
        #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// Apply a preset (repeatable)
        #[arg(short, long = "preset", value_name = "NAME")]
        preset: Vec<String>,

        /// Start from this user's stored overrides
        #[arg(short, long, value_name = "ID")]
        user: Option<i64>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Check a value against a setting's type and bounds
    Validate {
        /// Setting key or label
        key: String,

        /// Raw value as a user would type it
        value: String,
    },

    /// Look up a setting by key, label or a close spelling
    Find {
        /// Search text
        query: String,
    },

    /// Show what a computed setting reads and what reads it
    Deps {
        /// Setting key
        key: String,
    },

    /// List the available presets
    Presets,

    /// Print the slicing-engine command line for a mesh
    Command {
        /// Input mesh
        mesh: PathBuf,

        /// Output G-code file
        output: PathBuf,

        /// Override one setting (repeatable)
        #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
}

/// Parse `key=value`; the value may itself contain `=`.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_resolve_with_everything() {
        let cli = Cli::parse_from([
            "slicer",
            "--config",
            "/etc/slicer.toml",
            "resolve",
            "--set",
            "layer_height=0.12",
            "-s",
            "machine_start_gcode=G28 ; a=b",
            "--preset",
            "fine",
            "--user",
            "42",
            "--json",
        ]);
        assert_eq!(cli.config, PathBuf::from("/etc/slicer.toml"));
        assert_eq!(
            cli.command,
            Some(Commands::Resolve {
                set: vec![
                    ("layer_height".into(), "0.12".into()),
                    ("machine_start_gcode".into(), "G28 ; a=b".into()),
                ],
                preset: vec!["fine".into()],
                user: Some(42),
                json: true,
            })
        );
    }

    #[test]
    fn parse_assignment_rejects_missing_equals() {
        assert!(parse_assignment("layer_height").is_err());
        assert!(parse_assignment("=0.2").is_err());
        assert_eq!(parse_assignment("a=").unwrap(), ("a".into(), String::new()));
    }

    #[test]
    fn parse_command_positionals() {
        let cli = Cli::parse_from(["slicer", "command", "part.stl", "part.gcode", "-s", "scale=50"]);
        assert_eq!(
            cli.command,
            Some(Commands::Command {
                mesh: "part.stl".into(),
                output: "part.gcode".into(),
                set: vec![("scale".into(), "50".into())],
            })
        );
    }

    #[test]
    fn config_defaults_to_slicer_toml() {
        let cli = Cli::parse_from(["slicer", "presets"]);
        // SLICER_CONFIG may be set in the environment running the tests
        if std::env::var_os("SLICER_CONFIG").is_none() {
            assert_eq!(cli.config, PathBuf::from("slicer.toml"));
        }
        assert!(!cli.verbose);
    }
}
