// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Settings resolution engine for the auto-slicer front end
//!
//! The slicing engine consumes nothing but flat `-s key=value` flags and
//! evaluates nothing itself. This crate turns a printer definition chain, the
//! operator's defaults and a user's overrides into that flat table:
//!
//! - **Dependency graph**: static references between computed settings
//! - **Scheduling**: dependency-first evaluation order that tolerates cycles
//! - **Resolution pipeline**: layered merge, formula evaluation, G-code
//!   placeholder expansion and default pruning
//! - **Schema handle**: atomic swap of the loaded definitions on reload
//! - **Operator state**: configuration, presets, per-user overrides
//!
//! # Architecture
//!
//! ```text
//!                    slicer-cli
//!                        |
//!                   slicer-core
//!                        |
//!          +-------------+------------+
//!          |             |            |
//!     slicer-fs    slicer-expr   slicer-schema
//! ```
//!
//! # Example
//!
//! ```
//! use slicer_core::{ResolveRequest, SettingsEngine};
//! use slicer_expr::Value;
//! use slicer_schema::{AttributeDefinition, AttributeTable, ValueType};
//!
//! let engine = SettingsEngine::new(AttributeTable::new([
//!     AttributeDefinition::new("a", ValueType::Int, Value::Int(5)),
//!     AttributeDefinition::new("b", ValueType::Int, Value::Int(0)).with_expression("a + 1"),
//! ]));
//!
//! let resolution = engine.resolve(&ResolveRequest::default());
//! assert_eq!(resolution.emitted["b"], "6");
//! ```

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod graph;
pub mod handle;
pub mod presets;
pub mod template;
pub mod user;

pub use command::{EngineCommand, SCALE_KEYS, ScaleFactors, resolve_scale};
pub use config::{PathsConfig, SettingDefaults, SlicerConfig, builtin_defaults};
pub use engine::{Resolution, ResolveRequest, SettingsEngine};
pub use error::{Error, Result};
pub use eval::{CompiledFormulas, EvaluationResult, evaluate_in_order};
pub use graph::DependencyGraph;
pub use handle::SchemaHandle;
pub use presets::{AppliedPreset, Preset, PresetManager};
pub use template::{TEMPLATE_KEYS, expand_tokens, find_unknown_tokens};
pub use user::{StarredKeys, UserId, UserSettingsStore};
