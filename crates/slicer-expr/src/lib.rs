// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Sandboxed expression language for printer-definition value formulas.
//!
//! Printer definitions describe computed settings with small formulas such as
//! `math.ceil(bottom_thickness / resolveOrValue('layer_height'))`. This crate
//! parses those formulas into an [`Expr`] tree and evaluates them with a
//! tree-walking interpreter whose only external calls are the builtins in
//! [`Builtin`] and the `math` functions in [`interp`]. Nothing else is
//! reachable from an expression: no attribute access, no imports, no I/O.
//!
//! # Pipeline
//!
//! - [`lexer`] - logos tokenizer
//! - [`parser`] - Pratt parser producing [`Expr`]
//! - [`deps`] - static reference extraction (never evaluates)
//! - [`interp`] - evaluation against a [`Scope`]
//!
//! # Example
//!
//! ```
//! use slicer_expr::{Value, evaluate};
//! use std::collections::HashMap;
//!
//! let mut scope = HashMap::new();
//! scope.insert("layer_height".to_string(), Value::Float(0.2));
//! scope.insert("bottom_thickness".to_string(), Value::Float(0.8));
//!
//! let layers = evaluate("math.ceil(bottom_thickness / layer_height)", &scope).unwrap();
//! assert_eq!(layers, Value::Int(4));
//! ```

pub mod ast;
pub mod builtins;
pub mod deps;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::{BinaryOp, BoolOp, Callee, CompareOp, Expr, UnaryOp};
pub use builtins::Builtin;
pub use deps::{extract_references, references};
pub use error::{Error, EvalError, ParseError, Result};
pub use interp::{Scope, eval_expr};
pub use parser::parse;
pub use value::Value;

/// Parse and evaluate `source` against `scope` in one step.
pub fn evaluate<S: Scope + ?Sized>(source: &str, scope: &S) -> Result<Value> {
    let expr = parse(source)?;
    Ok(eval_expr(&expr, scope)?)
}
