//! Static reference extraction.
//!
//! Used to build the evaluation order before anything runs, so it never
//! evaluates and never fails: unparsable formulas simply reference nothing.

use crate::ast::{Callee, Expr};
use crate::builtins::Builtin;
use crate::parser::parse;
use std::collections::BTreeSet;

/// Names a formula reads, including string keys passed to schema accessors.
///
/// Builtin function names and the `math` namespace are excluded. Callers are
/// expected to intersect the result with the set of known settings.
pub fn references(expr: &Expr) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    expr.walk(&mut |node| match node {
        Expr::Name(name) if Builtin::from_name(name).is_none() && name != "math" => {
            refs.insert(name.clone());
        }
        Expr::Call {
            callee: Callee::Name(func),
            args,
        } => {
            let key_arg = match Builtin::from_name(func) {
                Some(Builtin::ResolveOrValue | Builtin::ExtruderValues) => args.first(),
                Some(Builtin::ExtruderValue) => args.get(1),
                _ => None,
            };
            if let Some(Expr::Str(key)) = key_arg {
                refs.insert(key.clone());
            }
        }
        _ => {}
    });
    refs
}

/// Parse `source` and extract its references; a parse failure yields none.
pub fn extract_references(source: &str) -> BTreeSet<String> {
    parse(source).map(|expr| references(&expr)).unwrap_or_default()
}
