//! Error types for slicer-core

use std::path::PathBuf;

/// Result type for slicer-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in slicer-core operations
///
/// Per-setting problems (formula failures, rejected overrides, unresolved
/// template tokens) are reported as data on a resolution, never as errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file could not be parsed
    #[error("Invalid configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// Custom preset file is malformed
    #[error("Invalid presets file {path}: {message}")]
    InvalidPresets { path: PathBuf, message: String },

    /// Per-user settings file is malformed
    #[error("Invalid user settings file {path}: {message}")]
    InvalidUserSettings { path: PathBuf, message: String },

    /// Preset name not known
    #[error("Preset not found: {name}")]
    PresetNotFound { name: String },

    /// The schema lock was poisoned by a panicking writer
    #[error("Schema handle is poisoned")]
    HandlePoisoned,

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from slicer-fs
    #[error(transparent)]
    Fs(#[from] slicer_fs::Error),

    /// Schema load error from slicer-schema
    #[error(transparent)]
    Schema(#[from] slicer_schema::Error),
}
