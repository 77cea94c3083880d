//! Comparison operations: =, !=, <, >, <=, >=
//!
//! `=` compares numerically across int/float and structurally for
//! everything else. The ordering operators chain over two or more
//! arguments and accept numbers or strings.

use crate::env::Environment;
use crate::error::ErrorKind;
use crate::value::Value;
use std::cmp::Ordering;
use std::rc::Rc;

/// Equality with numeric coercion between ints and floats.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => *x as f64 == *y,
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

fn compare(function: &str, a: &Value, b: &Value, position: usize) -> Result<Ordering, ErrorKind> {
    let ordering = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => x.partial_cmp(y),
        _ => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };
    ordering.ok_or_else(|| ErrorKind::type_error(function, "comparable values", b, position + 1))
}

fn chained(
    function: &'static str,
    args: &[Value],
    accept: fn(Ordering) -> bool,
) -> Result<Value, ErrorKind> {
    if args.len() < 2 {
        return Err(ErrorKind::arity_error(function, "at least two values", args.len()));
    }
    for (position, pair) in args.windows(2).enumerate() {
        if !accept(compare(function, &pair[0], &pair[1], position)?) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// Structural/numeric equality over all arguments.
pub fn builtin_eq(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() < 2 {
        return Err(ErrorKind::arity_error("=", "at least two values", args.len()));
    }
    Ok(Value::Bool(
        args.windows(2).all(|pair| values_equal(&pair[0], &pair[1])),
    ))
}

pub fn builtin_ne(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() != 2 {
        return Err(ErrorKind::arity_error("!=", "two values", args.len()));
    }
    Ok(Value::Bool(!values_equal(&args[0], &args[1])))
}

pub fn builtin_lt(args: &[Value]) -> Result<Value, ErrorKind> {
    chained("<", args, Ordering::is_lt)
}

pub fn builtin_gt(args: &[Value]) -> Result<Value, ErrorKind> {
    chained(">", args, Ordering::is_gt)
}

pub fn builtin_le(args: &[Value]) -> Result<Value, ErrorKind> {
    chained("<=", args, Ordering::is_le)
}

pub fn builtin_ge(args: &[Value]) -> Result<Value, ErrorKind> {
    chained(">=", args, Ordering::is_ge)
}

/// Register all comparison builtins in the environment.
pub fn register(env: &Rc<Environment>) {
    env.define("=".to_string(), Value::Builtin("=", builtin_eq));
    env.define("!=".to_string(), Value::Builtin("!=", builtin_ne));
    env.define("<".to_string(), Value::Builtin("<", builtin_lt));
    env.define(">".to_string(), Value::Builtin(">", builtin_gt));
    env.define("<=".to_string(), Value::Builtin("<=", builtin_le));
    env.define(">=".to_string(), Value::Builtin(">=", builtin_ge));
}
