//! Tree-walking evaluation of parsed formulas.
//!
//! Names resolve against a [`Scope`] first and the [`Builtin`] table second.
//! The `math` namespace is a closed set dispatched in [`call_math`]; anything
//! else is an [`EvalError`].

use crate::ast::{BinaryOp, BoolOp, Callee, CompareOp, Expr, UnaryOp};
use crate::builtins::{Builtin, contains};
use crate::error::EvalError;
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read-only name lookup for formula evaluation.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<&Value>;
}

impl<H: BuildHasher> Scope for HashMap<String, Value, H> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Scope for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// Evaluate a parsed formula.
pub fn eval_expr<S: Scope + ?Sized>(expr: &Expr, scope: &S) -> Result<Value, EvalError> {
    match expr {
        Expr::None => Ok(Value::None),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Float(x) => Ok(Value::Float(*x)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Name(name) => resolve_name(name, scope),
        Expr::List(items) => items
            .iter()
            .map(|e| eval_expr(e, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::MathAttr(name) => math_constant(name),
        Expr::Unary { op, operand } => unary(*op, eval_expr(operand, scope)?),
        Expr::Binary { op, left, right } => {
            let left = eval_expr(left, scope)?;
            let right = eval_expr(right, scope)?;
            binary(*op, &left, &right)
        }
        Expr::Logical { op, left, right } => {
            let left = eval_expr(left, scope)?;
            match (op, left.truthy()) {
                (BoolOp::And, false) | (BoolOp::Or, true) => Ok(left),
                _ => eval_expr(right, scope),
            }
        }
        Expr::Compare { first, rest } => {
            let mut left = eval_expr(first, scope)?;
            for (op, next) in rest {
                let right = eval_expr(next, scope)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::Conditional { test, body, orelse } => {
            if eval_expr(test, scope)?.truthy() {
                eval_expr(body, scope)
            } else {
                eval_expr(orelse, scope)
            }
        }
        Expr::Call { callee, args } => {
            let args = args
                .iter()
                .map(|e| eval_expr(e, scope))
                .collect::<Result<Vec<_>, _>>()?;
            match callee {
                Callee::Name(name) => match resolve_name(name, scope)? {
                    Value::Function(builtin) => builtin.call(args, scope),
                    _ => Err(EvalError::NotCallable(name.clone())),
                },
                Callee::Math(name) => call_math(name, &args),
            }
        }
        Expr::Subscript { value, index } => {
            let value = eval_expr(value, scope)?;
            let index = eval_expr(index, scope)?;
            subscript(&value, &index)
        }
    }
}

fn resolve_name<S: Scope + ?Sized>(name: &str, scope: &S) -> Result<Value, EvalError> {
    if let Some(value) = scope.lookup(name) {
        return Ok(value.clone());
    }
    Builtin::from_name(name)
        .map(Value::Function)
        .ok_or_else(|| EvalError::UndefinedName(name.to_string()))
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    match (op, &operand) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!operand.truthy())),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Neg, Value::Int(_) | Value::Bool(_)) => operand
            .as_i64()
            .and_then(i64::checked_neg)
            .map(Value::Int)
            .ok_or(EvalError::Overflow("negation")),
        (UnaryOp::Pos, Value::Float(_) | Value::Int(_)) => Ok(operand),
        (UnaryOp::Pos, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        (UnaryOp::Neg, other) => Err(EvalError::UnsupportedOperand {
            op: "-",
            operand: other.type_name(),
        }),
        (UnaryOp::Pos, other) => Err(EvalError::UnsupportedOperand {
            op: "+",
            operand: other.type_name(),
        }),
    }
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::UnsupportedOperands {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    // int (or bool) on both sides stays integral except for true division
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return int_binary(op, a, b);
    }
    if let (true, true, Some(a), Some(b)) = (left.is_number(), right.is_number(), left.as_f64(), right.as_f64()) {
        return float_binary(op, a, b);
    }

    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            checked_size(op, sequence_size(left).checked_add(sequence_size(right)))?;
            Ok(Value::Str(format!("{a}{b}")))
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            checked_size(op, sequence_size(left).checked_add(sequence_size(right)))?;
            Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinaryOp::Mul, Value::Str(s), n) | (BinaryOp::Mul, n, Value::Str(s)) if n.as_i64().is_some() => {
            let count = usize::try_from(n.as_i64().unwrap_or_default()).unwrap_or(0);
            checked_size(op, s.len().checked_mul(count))?;
            Ok(Value::Str(s.repeat(count)))
        }
        (BinaryOp::Mul, Value::List(items), n) | (BinaryOp::Mul, n, Value::List(items))
            if n.as_i64().is_some() =>
        {
            let count = usize::try_from(n.as_i64().unwrap_or_default()).unwrap_or(0);
            let unit = items.iter().map(sequence_size).fold(items.len(), usize::saturating_add);
            checked_size(op, unit.checked_mul(count))?;
            Ok(Value::List(
                std::iter::repeat_n(items.iter(), count).flatten().cloned().collect(),
            ))
        }
        _ => Err(unsupported(op, left, right)),
    }
}

/// Upper bound on the size of a string or list built by `+` or `*`.
///
/// Sizes are measured by [`sequence_size`], so nested lists count every
/// element they hold.
pub const MAX_SEQUENCE_SIZE: usize = 1 << 20;

/// Bytes of a string, or elements of a list including nested contents.
fn sequence_size(value: &Value) -> usize {
    match value {
        Value::Str(s) => s.len(),
        Value::List(items) => items.iter().map(sequence_size).fold(items.len(), usize::saturating_add),
        _ => 1,
    }
}

fn checked_size(op: BinaryOp, size: Option<usize>) -> Result<(), EvalError> {
    match size {
        Some(size) if size <= MAX_SEQUENCE_SIZE => Ok(()),
        _ => Err(EvalError::Overflow(op.symbol())),
    }
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let overflow = || EvalError::Overflow(op.symbol());
    match op {
        BinaryOp::Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
        BinaryOp::Sub => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
        BinaryOp::Mul => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
        BinaryOp::Div => float_binary(op, a as f64, b as f64),
        BinaryOp::FloorDiv | BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let q = a.checked_div(b).ok_or_else(overflow)?;
            let r = a - q * b;
            // Python rounds the quotient toward negative infinity
            let (q, r) = if r != 0 && ((r < 0) != (b < 0)) { (q - 1, r + b) } else { (q, r) };
            Ok(Value::Int(if op == BinaryOp::FloorDiv { q } else { r }))
        }
        BinaryOp::Pow => {
            if b < 0 {
                return float_binary(op, a as f64, b as f64);
            }
            let exp = u32::try_from(b).map_err(|_| overflow())?;
            a.checked_pow(exp).map(Value::Int).ok_or_else(overflow)
        }
    }
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) { r + b } else { r }
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(EvalError::MathDomain("pow"));
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(value))
}

/// Equality with numeric cross-type comparison (`1 == 1.0 == True`).
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (a, b) if a.is_number() && b.is_number() => a.as_f64() == b.as_f64(),
        (a, b) => a == b,
    }
}

/// Ordering for `<`-style comparisons, `max` and `min`.
pub(crate) fn compare_values(op: &'static str, left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    let mismatch = || EvalError::UnsupportedOperands {
        op,
        left: left.type_name(),
        right: right.type_name(),
    };
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b) {
                let ord = compare_values(op, x, y)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        (a, b) if a.is_number() && b.is_number() => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Ok(x.cmp(&y)),
            _ => a
                .as_f64()
                .zip(b.as_f64())
                .and_then(|(x, y)| x.partial_cmp(&y))
                .ok_or_else(mismatch),
        },
        _ => Err(mismatch()),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    let symbol = op.symbol();
    match op {
        CompareOp::Eq => Ok(values_equal(left, right)),
        CompareOp::Ne => Ok(!values_equal(left, right)),
        CompareOp::In | CompareOp::NotIn => {
            let found = match (left, right) {
                (_, Value::List(items)) => contains(items, left),
                (Value::Str(needle), Value::Str(haystack)) => haystack.contains(needle.as_str()),
                _ => {
                    return Err(EvalError::UnsupportedOperands {
                        op: symbol,
                        left: left.type_name(),
                        right: right.type_name(),
                    });
                }
            };
            Ok(found == (op == CompareOp::In))
        }
        CompareOp::Lt => Ok(compare_values(symbol, left, right)? == Ordering::Less),
        CompareOp::Le => Ok(compare_values(symbol, left, right)? != Ordering::Greater),
        CompareOp::Gt => Ok(compare_values(symbol, left, right)? == Ordering::Greater),
        CompareOp::Ge => Ok(compare_values(symbol, left, right)? != Ordering::Less),
    }
}

fn subscript(value: &Value, index: &Value) -> Result<Value, EvalError> {
    let Some(i) = index.as_i64() else {
        return Err(EvalError::UnsupportedOperands {
            op: "[]",
            left: value.type_name(),
            right: index.type_name(),
        });
    };
    let pick = |len: usize| -> Result<usize, EvalError> {
        let resolved = if i < 0 { i + len as i64 } else { i };
        if resolved < 0 || resolved >= len as i64 {
            return Err(EvalError::IndexOutOfRange { index: i, len });
        }
        Ok(resolved as usize)
    };
    match value {
        Value::List(items) => Ok(items[pick(items.len())?].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(chars[pick(chars.len())?].to_string()))
        }
        other => Err(EvalError::UnsupportedOperands {
            op: "[]",
            left: other.type_name(),
            right: index.type_name(),
        }),
    }
}

/// Convert an already-integral float to `i64`, rejecting non-finite or huge values.
pub(crate) fn float_to_int(func: &'static str, x: f64) -> Result<i64, EvalError> {
    if !x.is_finite() {
        return Err(EvalError::InvalidArgument {
            func,
            message: format!("cannot convert float {x} to integer"),
        });
    }
    if x < i64::MIN as f64 || x >= i64::MAX as f64 {
        return Err(EvalError::Overflow(func));
    }
    Ok(x as i64)
}

fn math_constant(name: &str) -> Result<Value, EvalError> {
    match name {
        "pi" => Ok(Value::Float(std::f64::consts::PI)),
        "e" => Ok(Value::Float(std::f64::consts::E)),
        "tau" => Ok(Value::Float(std::f64::consts::TAU)),
        "inf" => Ok(Value::Float(f64::INFINITY)),
        _ => Err(EvalError::UnknownMathAttribute(name.to_string())),
    }
}

fn math_arg(func: &'static str, args: &[Value], i: usize) -> Result<f64, EvalError> {
    let arg = &args[i];
    arg.as_f64().ok_or_else(|| EvalError::InvalidArgument {
        func,
        message: format!("must be real number, not {}", arg.type_name()),
    })
}

/// Call a function from the `math` namespace.
pub fn call_math(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let (func, min, max, expected): (&'static str, usize, usize, &'static str) = match name {
        "ceil" => ("ceil", 1, 1, "1"),
        "floor" => ("floor", 1, 1, "1"),
        "trunc" => ("trunc", 1, 1, "1"),
        "sqrt" => ("sqrt", 1, 1, "1"),
        "radians" => ("radians", 1, 1, "1"),
        "degrees" => ("degrees", 1, 1, "1"),
        "sin" => ("sin", 1, 1, "1"),
        "cos" => ("cos", 1, 1, "1"),
        "tan" => ("tan", 1, 1, "1"),
        "exp" => ("exp", 1, 1, "1"),
        "fabs" => ("fabs", 1, 1, "1"),
        "log" => ("log", 1, 2, "1 or 2"),
        "pow" => ("pow", 2, 2, "2"),
        _ => return Err(EvalError::UnknownMathAttribute(name.to_string())),
    };
    if args.len() < min || args.len() > max {
        return Err(EvalError::Arity {
            func,
            expected,
            got: args.len(),
        });
    }

    // Integers pass through ceil/floor/trunc untouched
    if matches!(func, "ceil" | "floor" | "trunc") {
        if let Value::Int(n) = &args[0] {
            return Ok(Value::Int(*n));
        }
    }

    let x = math_arg(func, args, 0)?;
    let value = match func {
        "ceil" => return float_to_int(func, x.ceil()).map(Value::Int),
        "floor" => return float_to_int(func, x.floor()).map(Value::Int),
        "trunc" => return float_to_int(func, x.trunc()).map(Value::Int),
        "sqrt" if x < 0.0 => return Err(EvalError::MathDomain(func)),
        "sqrt" => x.sqrt(),
        "radians" => x.to_radians(),
        "degrees" => x.to_degrees(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "exp" => x.exp(),
        "fabs" => x.abs(),
        "log" => {
            if x <= 0.0 {
                return Err(EvalError::MathDomain(func));
            }
            match args.get(1) {
                Some(_) => {
                    let base = math_arg(func, args, 1)?;
                    if base <= 0.0 || base == 1.0 {
                        return Err(EvalError::MathDomain(func));
                    }
                    x.ln() / base.ln()
                }
                None => x.ln(),
            }
        }
        "pow" => {
            let y = math_arg(func, args, 1)?;
            if x < 0.0 && y.fract() != 0.0 {
                return Err(EvalError::MathDomain(func));
            }
            x.powf(y)
        }
        _ => return Err(EvalError::UnknownMathAttribute(name.to_string())),
    };
    Ok(Value::Float(value))
}
