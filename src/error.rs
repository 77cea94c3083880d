// ABOUTME: Error types for evaluation failures in the interpreter

use crate::trace::CallTrace;
use crate::value::Value;
use std::fmt;
use thiserror::Error;

/// The failure taxonomy. Every failure unwinds the frame stack
/// unconditionally; the driver decides whether to print and continue
/// (REPL) or exit (script mode).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Produced by the parser; propagated unchanged by the evaluator.
    #[error("parse error: {0}")]
    Parse(String),

    /// Symbol not bound in any enclosing scope.
    #[error("name '{0}' is not defined")]
    Name(String),

    /// Attempted call on a non-callable value.
    #[error("value is not callable: {0}")]
    NotCallable(String),

    /// Argument list does not fit a function or macro parameter pattern.
    #[error("{callee}: cannot bind {actual} argument(s) to parameters {params}")]
    Arity {
        callee: String,
        params: String,
        actual: usize,
    },

    /// No match clause pattern accepted the value.
    #[error("match: no clause matched {0}")]
    MatchFailed(String),

    /// Type mismatch with function name, expected type, actual type, and position.
    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    TypeMismatch {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    /// Free-form type/shape error with context.
    #[error("{context}: {message}")]
    Type { context: String, message: String },

    /// Any failure crossing the host bridge; carries the host's message.
    #[error("host error: {0}")]
    Host(String),

    /// Invariant violation in the evaluator. Should never fire.
    #[error("internal evaluator error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Type mismatch for a callee argument, with full context.
    pub fn type_error(function: &str, expected: &str, actual: &Value, position: usize) -> Self {
        ErrorKind::TypeMismatch {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
            position,
        }
    }

    /// Free-form type/shape error with context.
    pub fn type_message(context: &str, message: impl Into<String>) -> Self {
        ErrorKind::Type {
            context: context.to_string(),
            message: message.into(),
        }
    }

    pub fn arity_error(callee: impl Into<String>, params: impl fmt::Display, actual: usize) -> Self {
        ErrorKind::Arity {
            callee: callee.into(),
            params: params.to_string(),
            actual,
        }
    }

    pub fn host(message: impl Into<String>) -> Self {
        ErrorKind::Host(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ErrorKind::Internal(message.into())
    }
}

/// An evaluation failure together with the call trace captured from the
/// live frame stack at the point of failure.
#[derive(Debug, Clone)]
pub struct LispError {
    pub kind: ErrorKind,
    pub trace: CallTrace,
}

impl LispError {
    pub fn new(kind: ErrorKind, trace: CallTrace) -> Self {
        LispError { kind, trace }
    }
}

impl From<ErrorKind> for LispError {
    fn from(kind: ErrorKind) -> Self {
        LispError {
            kind,
            trace: CallTrace::empty(),
        }
    }
}

impl fmt::Display for LispError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.trace.is_empty() {
            writeln!(f, "{}", self.trace)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for LispError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_error_message() {
        let err = ErrorKind::type_error("first", "list", &Value::Int(3), 1);
        assert_eq!(err.to_string(), "first: expected list, got int at argument 1");
    }

    #[test]
    fn test_arity_error_message() {
        let err = ErrorKind::arity_error("fact", "(n)", 2);
        assert_eq!(
            err.to_string(),
            "fact: cannot bind 2 argument(s) to parameters (n)"
        );
    }

    #[test]
    fn test_error_without_trace_displays_kind_only() {
        let err = LispError::from(ErrorKind::Name("x".to_string()));
        assert_eq!(err.to_string(), "name 'x' is not defined");
    }
}
