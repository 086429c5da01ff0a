//! Conversion of raw and computed values to an attribute's declared type.

use crate::definition::ValueType;
use slicer_expr::Value;

pub(crate) const TRUE_WORDS: [&str; 4] = ["true", "yes", "1", "on"];
pub(crate) const FALSE_WORDS: [&str; 4] = ["false", "no", "0", "off"];

/// Parse a boolean synonym, case-insensitively.
pub fn parse_bool(raw: &str) -> Option<bool> {
    let lower = raw.trim().to_lowercase();
    if TRUE_WORDS.contains(&lower.as_str()) {
        Some(true)
    } else if FALSE_WORDS.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Coerce a string input (config default, override, token lookup).
///
/// Unparsable numbers stay strings.
pub fn coerce_str(raw: &str, value_type: ValueType) -> Value {
    match value_type {
        ValueType::Int | ValueType::Float => coerce_value(Value::parse_literal(raw), value_type),
        ValueType::Bool => Value::Bool(parse_bool(raw).unwrap_or(!raw.is_empty())),
        ValueType::Enum | ValueType::Str => Value::Str(raw.to_string()),
    }
}

/// Coerce an already-typed value, e.g. a formula result.
///
/// A value that cannot be converted is returned unchanged.
pub fn coerce_value(value: Value, value_type: ValueType) -> Value {
    match (value_type, value) {
        (_, Value::None) => Value::None,
        (ValueType::Int, Value::Str(s)) => match Value::parse_literal(&s) {
            Value::Str(_) => Value::Str(s),
            number => coerce_value(number, ValueType::Int),
        },
        (ValueType::Int, v) => match v.as_f64().map(f64::round_ties_even) {
            Some(x) if x.is_finite() && x.abs() < 9.0e18 => Value::Int(x as i64),
            _ => v,
        },
        (ValueType::Float, Value::Str(s)) => match Value::parse_literal(&s) {
            Value::Str(_) => Value::Str(s),
            number => coerce_value(number, ValueType::Float),
        },
        (ValueType::Float, v) => match v.as_f64() {
            Some(x) => Value::Float(x),
            None => v,
        },
        (ValueType::Bool, Value::Str(s)) => Value::Bool(parse_bool(&s).unwrap_or(!s.is_empty())),
        (ValueType::Bool, v) => Value::Bool(v.truthy()),
        (ValueType::Enum | ValueType::Str, Value::Str(s)) => Value::Str(s),
        (ValueType::Enum | ValueType::Str, v) => Value::Str(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("2.5", ValueType::Int, Value::Int(2))]
    #[case("3.5", ValueType::Int, Value::Int(4))]
    #[case("7", ValueType::Float, Value::Float(7.0))]
    #[case("abc", ValueType::Float, Value::Str("abc".into()))]
    #[case("Off", ValueType::Bool, Value::Bool(false))]
    #[case("YES", ValueType::Bool, Value::Bool(true))]
    #[case("false", ValueType::Bool, Value::Bool(false))]
    #[case("maybe", ValueType::Bool, Value::Bool(true))]
    #[case("", ValueType::Bool, Value::Bool(false))]
    #[case("grid", ValueType::Enum, Value::Str("grid".into()))]
    fn strings_coerce_by_type(#[case] raw: &str, #[case] ty: ValueType, #[case] expected: Value) {
        assert_eq!(coerce_str(raw, ty), expected);
    }

    #[rstest]
    #[case(Value::Float(3.7), ValueType::Int, Value::Int(4))]
    #[case(Value::Int(3), ValueType::Float, Value::Float(3.0))]
    #[case(Value::Int(0), ValueType::Bool, Value::Bool(false))]
    #[case(Value::Float(0.2), ValueType::Str, Value::Str("0.2".into()))]
    #[case(Value::None, ValueType::Int, Value::None)]
    #[case(Value::List(vec![]), ValueType::Float, Value::List(vec![]))]
    fn values_coerce_by_type(#[case] value: Value, #[case] ty: ValueType, #[case] expected: Value) {
        assert_eq!(coerce_value(value, ty), expected);
    }
}
