//! Filesystem helpers for the auto-slicer settings engine
//!
//! Provides atomic writes for runtime state files and a format-agnostic
//! document store for JSON and TOML documents.

pub mod error;
pub mod io;
pub mod store;

pub use error::{Error, Result};
pub use store::DocumentStore;
