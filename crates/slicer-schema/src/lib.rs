// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Printer definition schema for the auto-slicer settings engine.
//!
//! Loads a chain of layered definition documents into an immutable
//! [`AttributeTable`], applies operator bound overrides, validates user
//! input against attribute types and bounds, and resolves loosely typed
//! setting names.

pub mod bounds;
pub mod coerce;
pub mod definition;
pub mod document;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod table;
pub mod validate;

pub use bounds::BoundsOverrides;
pub use coerce::{coerce_str, coerce_value, parse_bool};
pub use definition::{AttributeDefinition, BoundField, ValueType};
pub use document::{AttributeOverride, SchemaDocument, SchemaNode};
pub use error::{Error, Result};
pub use loader::{DefinitionSource, DirectorySource, MemorySource, SchemaLoader};
pub use matcher::{SettingMatch, resolve_setting};
pub use table::{AttributeTable, normalize_key};
pub use validate::{ValidationOutcome, validate, validate_key};
