//! The fixed function whitelist available to formulas.
//!
//! This table, together with the `math` functions in [`crate::interp`], is the
//! whole of what an expression can call. Schema accessors resolve purely by
//! scope lookup; the per-extruder accessors see a single extruder.

use crate::error::EvalError;
use crate::interp::{Scope, compare_values, float_to_int, values_equal};
use crate::value::{Value, parse_float};
use std::cmp::Ordering;

/// A whitelisted callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Max,
    Min,
    Round,
    Int,
    Float,
    Bool,
    Str,
    Len,
    Sum,
    Map,
    Abs,
    Any,
    All,
    /// `resolveOrValue(key)`
    ResolveOrValue,
    /// `extruderValue(extruder, key)`
    ExtruderValue,
    /// `extruderValues(key)`
    ExtruderValues,
}

impl Builtin {
    pub const ALL: [Builtin; 16] = [
        Builtin::Max,
        Builtin::Min,
        Builtin::Round,
        Builtin::Int,
        Builtin::Float,
        Builtin::Bool,
        Builtin::Str,
        Builtin::Len,
        Builtin::Sum,
        Builtin::Map,
        Builtin::Abs,
        Builtin::Any,
        Builtin::All,
        Builtin::ResolveOrValue,
        Builtin::ExtruderValue,
        Builtin::ExtruderValues,
    ];

    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Max => "max",
            Builtin::Min => "min",
            Builtin::Round => "round",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::Str => "str",
            Builtin::Len => "len",
            Builtin::Sum => "sum",
            Builtin::Map => "map",
            Builtin::Abs => "abs",
            Builtin::Any => "any",
            Builtin::All => "all",
            Builtin::ResolveOrValue => "resolveOrValue",
            Builtin::ExtruderValue => "extruderValue",
            Builtin::ExtruderValues => "extruderValues",
        }
    }

    /// True for the schema accessors whose string argument names a setting.
    pub fn is_accessor(self) -> bool {
        matches!(
            self,
            Builtin::ResolveOrValue | Builtin::ExtruderValue | Builtin::ExtruderValues
        )
    }

    /// Invoke with already-evaluated arguments.
    pub fn call<S: Scope + ?Sized>(self, args: Vec<Value>, scope: &S) -> Result<Value, EvalError> {
        let func = self.name();
        match self {
            Builtin::Max => extremum(func, args, Ordering::Greater),
            Builtin::Min => extremum(func, args, Ordering::Less),
            Builtin::Round => {
                arity(func, &args, 1, 2, "1 or 2")?;
                round(&args[0], args.get(1))
            }
            Builtin::Int => {
                arity(func, &args, 1, 1, "1")?;
                to_int(&args[0])
            }
            Builtin::Float => {
                arity(func, &args, 1, 1, "1")?;
                to_float(&args[0])
            }
            Builtin::Bool => {
                arity(func, &args, 0, 1, "0 or 1")?;
                Ok(Value::Bool(args.first().is_some_and(Value::truthy)))
            }
            Builtin::Str => {
                arity(func, &args, 0, 1, "0 or 1")?;
                Ok(Value::Str(args.first().map(Value::formula_text).unwrap_or_default()))
            }
            Builtin::Len => {
                arity(func, &args, 1, 1, "1")?;
                match &args[0] {
                    Value::List(items) => Ok(Value::Int(items.len() as i64)),
                    Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                    other => Err(invalid(func, format!("object of type '{}' has no len()", other.type_name()))),
                }
            }
            Builtin::Sum => {
                arity(func, &args, 1, 2, "1 or 2")?;
                let start = args.get(1).cloned().unwrap_or(Value::Int(0));
                sum(iterate(func, &args[0])?, start)
            }
            Builtin::Map => {
                arity(func, &args, 2, 2, "2")?;
                let callee = match &args[0] {
                    Value::Function(b) => *b,
                    other => return Err(EvalError::NotCallable(other.type_name().to_string())),
                };
                iterate(func, &args[1])?
                    .into_iter()
                    .map(|item| callee.call(vec![item], scope))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            Builtin::Abs => {
                arity(func, &args, 1, 1, "1")?;
                match &args[0] {
                    Value::Int(n) => n.checked_abs().map(Value::Int).ok_or(EvalError::Overflow("abs")),
                    Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
                    Value::Float(x) => Ok(Value::Float(x.abs())),
                    other => Err(EvalError::UnsupportedOperand {
                        op: "abs()",
                        operand: other.type_name(),
                    }),
                }
            }
            Builtin::Any => {
                arity(func, &args, 1, 1, "1")?;
                Ok(Value::Bool(iterate(func, &args[0])?.iter().any(Value::truthy)))
            }
            Builtin::All => {
                arity(func, &args, 1, 1, "1")?;
                Ok(Value::Bool(iterate(func, &args[0])?.iter().all(Value::truthy)))
            }
            Builtin::ResolveOrValue => {
                arity(func, &args, 1, 1, "1")?;
                Ok(lookup_key(func, &args[0], scope)?.unwrap_or(Value::None))
            }
            Builtin::ExtruderValue => {
                arity(func, &args, 2, 2, "2")?;
                Ok(lookup_key(func, &args[1], scope)?.unwrap_or(Value::None))
            }
            Builtin::ExtruderValues => {
                arity(func, &args, 1, 1, "1")?;
                Ok(Value::List(match lookup_key(func, &args[0], scope)? {
                    Some(Value::None) | None => Vec::new(),
                    Some(value) => vec![value],
                }))
            }
        }
    }
}

fn arity(
    func: &'static str,
    args: &[Value],
    min: usize,
    max: usize,
    expected: &'static str,
) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        return Err(EvalError::Arity {
            func,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn invalid(func: &'static str, message: impl Into<String>) -> EvalError {
    EvalError::InvalidArgument {
        func,
        message: message.into(),
    }
}

/// Items of a list, or the characters of a string.
fn iterate(func: &'static str, value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(invalid(func, format!("'{}' object is not iterable", other.type_name()))),
    }
}

fn lookup_key<S: Scope + ?Sized>(
    func: &'static str,
    key: &Value,
    scope: &S,
) -> Result<Option<Value>, EvalError> {
    match key {
        Value::Str(name) => Ok(scope.lookup(name).cloned()),
        other => Err(invalid(func, format!("setting key must be a string, not '{}'", other.type_name()))),
    }
}

/// `max`/`min` over either one iterable or several positional arguments.
fn extremum(func: &'static str, args: Vec<Value>, keep: Ordering) -> Result<Value, EvalError> {
    let items = match args.len() {
        0 => {
            return Err(EvalError::Arity {
                func,
                expected: "at least 1",
                got: 0,
            });
        }
        1 => iterate(func, &args[0])?,
        _ => args,
    };

    let mut iter = items.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| invalid(func, "arg is an empty sequence"))?;
    for item in iter {
        if compare_values(func, &item, &best)? == keep {
            best = item;
        }
    }
    Ok(best)
}

fn round(value: &Value, digits: Option<&Value>) -> Result<Value, EvalError> {
    let digits = match digits {
        None | Some(Value::None) => None,
        Some(d) => Some(d.as_i64().ok_or_else(|| {
            invalid("round", format!("'{}' object cannot be interpreted as an integer", d.type_name()))
        })?),
    };

    match (value, digits) {
        (Value::Int(_) | Value::Bool(_), None) => Ok(Value::Int(value.as_i64().unwrap_or_default())),
        (Value::Int(n), Some(d)) => {
            if d >= 0 {
                return Ok(Value::Int(*n));
            }
            let factor = 10f64.powi(d.saturating_neg().min(308) as i32);
            let rounded = ((*n as f64) / factor).round_ties_even() * factor;
            Ok(Value::Int(float_to_int("round", rounded)?))
        }
        (Value::Float(x), None) => Ok(Value::Int(float_to_int("round", x.round_ties_even())?)),
        (Value::Float(x), Some(d)) => {
            if !x.is_finite() {
                return Ok(Value::Float(*x));
            }
            let factor = 10f64.powi(d.clamp(-308, 308) as i32);
            let scaled = x * factor;
            if !scaled.is_finite() {
                return Ok(Value::Float(*x));
            }
            Ok(Value::Float(scaled.round_ties_even() / factor))
        }
        (other, _) => Err(EvalError::UnsupportedOperand {
            op: "round()",
            operand: other.type_name(),
        }),
    }
}

fn to_int(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(x) => Ok(Value::Int(float_to_int("int", x.trunc())?)),
        Value::Str(s) => s
            .trim()
            .replace('_', "")
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid("int", format!("invalid literal for int() with base 10: '{s}'"))),
        other => Err(invalid(
            "int",
            format!("argument must be a string or a number, not '{}'", other.type_name()),
        )),
    }
}

fn to_float(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Str(s) => parse_float(s.trim())
            .map(Value::Float)
            .ok_or_else(|| invalid("float", format!("could not convert string to float: '{s}'"))),
        other => other.as_f64().map(Value::Float).ok_or_else(|| {
            invalid(
                "float",
                format!("argument must be a string or a number, not '{}'", other.type_name()),
            )
        }),
    }
}

fn sum(items: Vec<Value>, start: Value) -> Result<Value, EvalError> {
    let mut total = start;
    for item in items {
        total = match (&total, &item) {
            (a, b) if a.as_i64().is_some() && b.as_i64().is_some() => {
                let (a, b) = (a.as_i64().unwrap_or_default(), b.as_i64().unwrap_or_default());
                Value::Int(a.checked_add(b).ok_or(EvalError::Overflow("sum"))?)
            }
            (a, b) if a.is_number() && b.is_number() => {
                Value::Float(a.as_f64().unwrap_or_default() + b.as_f64().unwrap_or_default())
            }
            (a, b) => {
                return Err(EvalError::UnsupportedOperands {
                    op: "+",
                    left: a.type_name(),
                    right: b.type_name(),
                });
            }
        };
    }
    Ok(total)
}

/// Equality used by `in` and list comparison.
pub(crate) fn contains(haystack: &[Value], needle: &Value) -> bool {
    haystack.iter().any(|item| values_equal(item, needle))
}
