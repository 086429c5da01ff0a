//! Type and bounds checking of user-supplied values.

use crate::coerce::parse_bool;
use crate::definition::{AttributeDefinition, ValueType};
use crate::table::AttributeTable;
use serde::Serialize;
use slicer_expr::value::format_float;

/// Result of checking one raw value against an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub accepted: bool,
    /// Canonical form to store and emit
    pub normalized_value: String,
    /// Set iff rejected
    pub error: Option<String>,
    /// Set iff accepted outside a soft bound
    pub warning: Option<String>,
}

impl ValidationOutcome {
    fn accept(normalized: impl Into<String>) -> Self {
        Self {
            accepted: true,
            normalized_value: normalized.into(),
            error: None,
            warning: None,
        }
    }

    fn reject(raw: &str, error: String) -> Self {
        Self {
            accepted: false,
            normalized_value: raw.to_string(),
            error: Some(error),
            warning: None,
        }
    }
}

/// A number as it appears in validation messages.
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn value(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    fn text(self) -> String {
        match self {
            Number::Int(n) => n.to_string(),
            Number::Float(x) => format_float(x),
        }
    }
}

/// Check `raw` against `attr`'s declared type and bounds.
pub fn validate(attr: &AttributeDefinition, raw: &str) -> ValidationOutcome {
    match attr.value_type {
        ValueType::Float => validate_float(attr, raw),
        ValueType::Int => validate_int(attr, raw),
        ValueType::Bool => validate_bool(raw),
        ValueType::Enum => validate_enum(attr, raw),
        ValueType::Str => ValidationOutcome::accept(raw),
    }
}

/// Validate against the attribute called `key`, if the table has one.
pub fn validate_key(table: &AttributeTable, key: &str, raw: &str) -> Option<ValidationOutcome> {
    table.get(key).map(|attr| validate(attr, raw))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

fn validate_float(attr: &AttributeDefinition, raw: &str) -> ValidationOutcome {
    match parse_number(raw) {
        Some(value) => check_bounds(attr, Number::Float(value), raw.trim().to_string()),
        None => ValidationOutcome::reject(raw, format!("Expected a number, got '{raw}'")),
    }
}

fn validate_int(attr: &AttributeDefinition, raw: &str) -> ValidationOutcome {
    if let Ok(n) = raw.trim().parse::<i64>() {
        return check_bounds(attr, Number::Int(n), n.to_string());
    }
    // "3.0" is accepted as 3
    match parse_number(raw) {
        Some(x) if x.fract() == 0.0 && x.abs() < 9.0e18 => {
            let n = x as i64;
            check_bounds(attr, Number::Int(n), n.to_string())
        }
        _ => ValidationOutcome::reject(raw, format!("Expected an integer, got '{raw}'")),
    }
}

fn check_bounds(attr: &AttributeDefinition, value: Number, normalized: String) -> ValidationOutcome {
    let unit = attr.unit.as_deref().map(|u| format!(" {u}")).unwrap_or_default();
    let x = value.value();
    let shown = value.text();
    let bound = |b: f64| format!("{}{unit}", format_float(b));

    if let Some(min) = attr.minimum_value.filter(|min| x < *min) {
        return ValidationOutcome::reject(
            &normalized,
            format!("Value {shown}{unit} is below minimum ({})", bound(min)),
        );
    }
    if let Some(max) = attr.maximum_value.filter(|max| x > *max) {
        return ValidationOutcome::reject(
            &normalized,
            format!("Value {shown}{unit} is above maximum ({})", bound(max)),
        );
    }

    let warning = if let Some(min) = attr.minimum_value_warning.filter(|min| x < *min) {
        Some(format!(
            "Value {shown}{unit} is below recommended minimum ({})",
            bound(min)
        ))
    } else {
        attr.maximum_value_warning.filter(|max| x > *max).map(|max| {
            format!(
                "Value {shown}{unit} is above recommended maximum ({})",
                bound(max)
            )
        })
    };

    ValidationOutcome {
        warning,
        ..ValidationOutcome::accept(normalized)
    }
}

fn validate_bool(raw: &str) -> ValidationOutcome {
    match parse_bool(raw) {
        Some(b) => ValidationOutcome::accept(b.to_string()),
        None => ValidationOutcome::reject(raw, format!("Expected true/false, got '{raw}'")),
    }
}

fn validate_enum(attr: &AttributeDefinition, raw: &str) -> ValidationOutcome {
    if attr.options.iter().any(|(key, _)| key == raw) {
        return ValidationOutcome::accept(raw);
    }

    let lower = raw.to_lowercase();
    let matched = attr
        .options
        .iter()
        .find(|(key, _)| key.to_lowercase() == lower)
        .or_else(|| attr.options.iter().find(|(_, label)| label.to_lowercase() == lower));
    if let Some((key, _)) = matched {
        return ValidationOutcome::accept(key.clone());
    }

    let valid: Vec<&str> = attr.options.iter().map(|(key, _)| key.as_str()).collect();
    ValidationOutcome::reject(
        raw,
        format!("Invalid option '{raw}'. Valid options: {}", valid.join(", ")),
    )
}
