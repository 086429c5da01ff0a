//! Placeholder expansion inside free-text G-code settings.
//!
//! Start and end G-code carry `{identifier}` or `{expression}` placeholders
//! that the slicing engine never evaluates. They are expanded here against a
//! token namespace; anything that fails stays verbatim and is reported by
//! [`find_unknown_tokens`] so callers can refuse the batch.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use slicer_expr::{Value, evaluate};

/// Free-text settings that carry placeholders and are always emitted.
pub const TEMPLATE_KEYS: [&str; 2] = ["machine_start_gcode", "machine_end_gcode"];

/// Expansion stops after this many passes even if placeholders remain.
const MAX_PASSES: usize = 8;

/// Longest text placeholder expansion may produce.
pub const MAX_TEMPLATE_LEN: usize = 64 * 1024;

/// `{...}` with no nested closing brace.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^}]+)\}").unwrap());

/// Whether `key` is one of the free-text template settings.
pub fn is_template_key(key: &str) -> bool {
    TEMPLATE_KEYS.contains(&key)
}

/// Read a setting string as a formula value.
///
/// Integral numbers become integers so `{bed_temp}` with `60.0` expands to
/// `60`; other finite numbers stay floats and everything else is text.
pub fn token_value(text: &str) -> Value {
    match Value::parse_literal(text) {
        Value::Float(x) if x.is_finite() => {
            if x.fract() == 0.0 && x.abs() < 9.0e15 {
                Value::Int(x as i64)
            } else {
                Value::Float(x)
            }
        }
        Value::Float(_) => Value::Str(text.to_string()),
        other => other,
    }
}

/// Build a token namespace from string settings.
pub fn token_namespace<'a>(
    settings: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> BTreeMap<String, Value> {
    settings
        .into_iter()
        .map(|(key, value)| (key.clone(), token_value(value)))
        .collect()
}

/// Expand every placeholder in `text` once.
///
/// Returns `None` as soon as the output grows past [`MAX_TEMPLATE_LEN`].
fn expand_once(text: &str, namespace: &BTreeMap<String, Value>) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        match evaluate(&caps[1], namespace) {
            Ok(value) => out.push_str(&value.formula_text()),
            Err(e) => {
                tracing::debug!(token = &caps[1], error = %e, "Placeholder left unresolved");
                out.push_str(whole.as_str());
            }
        }
        last = whole.end();
        if out.len() > MAX_TEMPLATE_LEN {
            return None;
        }
    }
    out.push_str(&text[last..]);
    (out.len() <= MAX_TEMPLATE_LEN).then_some(out)
}

/// Expand until a pass changes nothing.
///
/// Returns the last text within [`MAX_TEMPLATE_LEN`] and whether it reached
/// a fixed point.
fn settle(text: &str, namespace: &BTreeMap<String, Value>) -> (String, bool) {
    let mut current = text.to_string();
    for _ in 0..MAX_PASSES {
        match expand_once(&current, namespace) {
            Some(next) if next == current => return (current, true),
            Some(next) => current = next,
            None => return (current, false),
        }
    }
    let settled = expand_once(&current, namespace).is_some_and(|next| next == current);
    (current, settled)
}

/// Expand placeholders until the text stops changing.
///
/// A substituted value may itself contain placeholders, so expansion repeats
/// up to a fixed number of passes. Unresolvable placeholders are left as-is.
/// Expansion that keeps growing stops at the last pass within
/// [`MAX_TEMPLATE_LEN`]; its leftover placeholders are then reported by
/// [`find_unknown_tokens`].
pub fn expand_tokens(text: &str, namespace: &BTreeMap<String, Value>) -> String {
    let (expanded, settled) = settle(text, namespace);
    if !settled {
        tracing::warn!(len = expanded.len(), "Placeholder expansion did not settle");
    }
    expanded
}

/// Placeholders in the template settings of `settings` that do not expand.
///
/// A placeholder counts as unknown when it fails to evaluate, expands back
/// into itself, or sits in text whose expansion outgrows
/// [`MAX_TEMPLATE_LEN`]. Returns `template key -> [placeholder bodies]`,
/// omitting clean keys and listing each body once.
pub fn find_unknown_tokens(
    settings: &BTreeMap<String, String>,
    namespace: &BTreeMap<String, Value>,
) -> BTreeMap<String, Vec<String>> {
    let mut unknown = BTreeMap::new();
    for key in TEMPLATE_KEYS {
        let Some(text) = settings.get(key) else {
            continue;
        };
        let (expanded, _) = settle(text, namespace);
        let mut failed: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&expanded) {
            if !failed.iter().any(|body| body == &caps[1]) {
                failed.push(caps[1].to_string());
            }
        }
        if !failed.is_empty() {
            tracing::warn!(key, tokens = ?failed, "Unresolved G-code placeholders");
            unknown.insert(key.to_string(), failed);
        }
    }
    unknown
}
