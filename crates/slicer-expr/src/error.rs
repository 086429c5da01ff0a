//! Error types for slicer-expr

use std::fmt;

/// Result type for slicer-expr operations
pub type Result<T> = std::result::Result<T, Error>;

/// A formula failed to tokenize or parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,
    /// Byte offset into the formula source
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at offset {})", self.message, self.offset)
    }
}

impl std::error::Error for ParseError {}

/// A parsed formula failed while being evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    UndefinedName(String),

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("module 'math' has no attribute '{0}'")]
    UnknownMathAttribute(String),

    #[error("unsupported operand type(s) for {op}: '{left}' and '{right}'")]
    UnsupportedOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("bad operand type for unary {op}: '{operand}'")]
    UnsupportedOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    Overflow(&'static str),

    #[error("{func}() takes {expected} argument(s) ({got} given)")]
    Arity {
        func: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("{func}(): {message}")]
    InvalidArgument { func: &'static str, message: String },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("math domain error in {0}()")]
    MathDomain(&'static str),
}

/// Any failure turning formula text into a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}
