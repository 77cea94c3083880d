//! Conversions: str, int, float
//!
//! `str` renders and concatenates its arguments (strings unquoted);
//! `int` and `float` convert numbers, strings, and bools, failing on
//! anything else.

use crate::env::Environment;
use crate::error::ErrorKind;
use crate::value::Value;
use std::rc::Rc;

/// Renders all arguments and joins them into one string.
pub fn builtin_str(args: &[Value]) -> Result<Value, ErrorKind> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&arg.to_display_string());
    }
    Ok(Value::Str(out))
}

pub fn builtin_int(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() != 1 {
        return Err(ErrorKind::arity_error("int", "one value", args.len()));
    }
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(n) => Ok(Value::Int(*n as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ErrorKind::type_message("int", format!("cannot parse \"{}\"", s))),
        other => Err(ErrorKind::type_error("int", "number, string, or bool", other, 1)),
    }
}

pub fn builtin_float(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() != 1 {
        return Err(ErrorKind::arity_error("float", "one value", args.len()));
    }
    match &args[0] {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(n) => Ok(Value::Float(*n)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ErrorKind::type_message("float", format!("cannot parse \"{}\"", s))),
        other => Err(ErrorKind::type_error("float", "number, string, or bool", other, 1)),
    }
}

/// Register conversion builtins in the environment.
pub fn register(env: &Rc<Environment>) {
    env.define("str".to_string(), Value::Builtin("str", builtin_str));
    env.define("int".to_string(), Value::Builtin("int", builtin_int));
    env.define("float".to_string(), Value::Builtin("float", builtin_float));
}
