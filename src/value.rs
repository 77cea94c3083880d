// ABOUTME: Value types representing runtime data, closures, and the
// conversions between code and data that make quoting and macros work

use crate::env::Environment;
use crate::error::ErrorKind;
use crate::form::Form;
use crate::host::{HostCallable, HostObject};
use std::fmt;
use std::rc::Rc;

/// The signature of a native builtin function.
pub type BuiltinFn = fn(&[Value]) -> Result<Value, ErrorKind>;

/// A user-defined function or macro: parameter pattern, body, and the
/// environment captured at the definition site (lexical scoping).
#[derive(Debug)]
pub struct Closure {
    pub name: Option<String>,
    /// A `Form::List` of parameter patterns, possibly with an `&` rest marker.
    pub params: Form,
    /// A single form; multi-form bodies are wrapped in `(do ...)`.
    pub body: Form,
    pub env: Rc<Environment>,
}

impl Closure {
    /// Name for error messages and traces.
    pub fn describe(&self) -> &str {
        self.name.as_deref().unwrap_or("#<fn>")
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered sequence, used for both tuples and lists.
    List(Vec<Value>),
    /// A form carried at runtime: symbols and inert quote/unquote nodes.
    /// Lists and literals lower to their value counterparts instead.
    Form(Form),
    Fn(Rc<Closure>),
    Macro(Rc<Closure>),
    Builtin(&'static str, BuiltinFn),
    HostObject(HostObject),
    HostCallable(HostCallable),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Form(Form::Symbol(_)) => "symbol",
            Value::Form(_) => "code",
            Value::Fn(_) => "function",
            Value::Macro(_) => "macro",
            Value::Builtin(..) => "builtin",
            Value::HostObject(_) => "host object",
            Value::HostCallable(_) => "host callable",
        }
    }

    /// Core truthiness rule: only nil and false are falsy. Zero, the
    /// empty string, and the empty list are truthy. Host bridges may
    /// widen this for host values via `HostBridge::is_truthy`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Rendering for `print` and `str`: strings appear without quotes.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Value::Form(form) => write!(f, "{}", form),
            Value::Fn(c) => match &c.name {
                Some(name) => write!(f, "#<fn {}>", name),
                None => write!(f, "#<fn>"),
            },
            Value::Macro(c) => match &c.name {
                Some(name) => write!(f, "#<macro {}>", name),
                None => write!(f, "#<macro>"),
            },
            Value::Builtin(name, _) => write!(f, "#<builtin {}>", name),
            Value::HostObject(obj) => write!(f, "#<{}>", obj.label),
            Value::HostCallable(c) => write!(f, "#<{}>", c.label),
        }
    }
}

impl PartialEq for Value {
    /// Value-typed equality for data; identity for functions, macros,
    /// and host handles. `Int` and `Float` are distinct here; the `=`
    /// builtin compares numerically across the two.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Form(a), Value::Form(b)) => a == b,
            (Value::Fn(a), Value::Fn(b)) => Rc::ptr_eq(a, b),
            (Value::Macro(a), Value::Macro(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a, f), Value::Builtin(b, g)) => a == b && f == g,
            (Value::HostObject(a), Value::HostObject(b)) => a.same(b),
            (Value::HostCallable(a), Value::HostCallable(b)) => a.same(b),
            _ => false,
        }
    }
}

/// Converts a form to the value it denotes as data. Literals become the
/// corresponding values, lists map elementwise; symbols and inert
/// quote/unquote nodes are carried as `Value::Form`. Used by `quote` and
/// by macro-argument binding.
pub fn lower(form: &Form) -> Value {
    match form {
        Form::Int(n) => Value::Int(*n),
        Form::Float(n) => Value::Float(*n),
        Form::Str(s) => Value::Str(s.clone()),
        Form::Bool(b) => Value::Bool(*b),
        Form::Nil => Value::Nil,
        Form::List(items) => Value::List(items.iter().map(lower).collect()),
        Form::Symbol(_) | Form::Quoted(_) | Form::Unquoted(_) => Value::Form(form.clone()),
    }
}

/// The inverse of `lower`: turns data back into code so macro expansions
/// and `eval` arguments can re-enter the evaluator. Functions and host
/// handles have no source representation and fail.
pub fn reify(value: &Value) -> Result<Form, ErrorKind> {
    match value {
        Value::Nil => Ok(Form::Nil),
        Value::Bool(b) => Ok(Form::Bool(*b)),
        Value::Int(n) => Ok(Form::Int(*n)),
        Value::Float(n) => Ok(Form::Float(*n)),
        Value::Str(s) => Ok(Form::Str(s.clone())),
        Value::Form(form) => Ok(form.clone()),
        Value::List(items) => Ok(Form::List(
            items.iter().map(reify).collect::<Result<Vec<_>, _>>()?,
        )),
        other => Err(ErrorKind::type_message(
            "code",
            format!("cannot use {} as code", other.type_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_values() {
        assert_eq!(Value::Nil.to_string(), "None");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Str("hi".to_string()).to_string(), "\"hi\"");

        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(list.to_string(), "(1 2)");
    }

    #[test]
    fn test_display_string_is_unquoted_for_print() {
        assert_eq!(Value::Str("hi".to_string()).to_display_string(), "hi");
        assert_eq!(Value::Int(3).to_display_string(), "3");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::Str(String::new()).is_truthy());
        assert!(Value::List(vec![]).is_truthy());
    }

    #[test]
    fn test_int_and_float_are_distinct_under_structural_equality() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Int(1), Value::Int(1));
    }

    #[test]
    fn test_lower_reify_round_trip() {
        let form = Form::List(vec![
            Form::symbol("if"),
            Form::List(vec![Form::symbol("="), Form::Int(1), Form::Int(1)]),
            Form::Str("yes".to_string()),
            Form::Nil,
        ]);
        let lowered = lower(&form);
        assert_eq!(reify(&lowered).unwrap(), form);
    }

    #[test]
    fn test_reify_rejects_functions() {
        let closure = Rc::new(Closure {
            name: None,
            params: Form::List(vec![]),
            body: Form::Nil,
            env: Environment::new(),
        });
        assert!(reify(&Value::Fn(closure)).is_err());
    }
}
