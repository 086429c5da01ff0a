//! Error types for slicer-schema

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Schema load failures. Any of these aborts the whole load.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] slicer_fs::Error),

    #[error("Definition '{name}' not found at {path}")]
    DefinitionNotFound { name: String, path: PathBuf },

    #[error("Invalid definition '{name}': {message}")]
    InvalidDefinition { name: String, message: String },

    #[error("Inheritance cycle in definitions: {}", chain.join(" -> "))]
    InheritanceCycle { chain: Vec<String> },
}
