//! Arithmetic operations: +, -, *, /
//!
//! `+`, `-`, and `*` stay in integers when every operand is an integer
//! and promote to floats otherwise (integer overflow also promotes).
//! `/` always produces a float, matching the host runtime's true
//! division. Division by zero is an error.

use crate::env::Environment;
use crate::error::ErrorKind;
use crate::value::Value;
use std::rc::Rc;

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(n) => n,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(n) => Value::Int(n),
            Num::Float(n) => Value::Float(n),
        }
    }
}

fn number(function: &str, args: &[Value], position: usize) -> Result<Num, ErrorKind> {
    match &args[position] {
        Value::Int(n) => Ok(Num::Int(*n)),
        Value::Float(n) => Ok(Num::Float(*n)),
        other => Err(ErrorKind::type_error(function, "number", other, position + 1)),
    }
}

fn combine(a: Num, b: Num, int_op: fn(i64, i64) -> Option<i64>, float_op: fn(f64, f64) -> f64) -> Num {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => match int_op(x, y) {
            Some(n) => Num::Int(n),
            None => Num::Float(float_op(x as f64, y as f64)),
        },
        _ => Num::Float(float_op(a.as_f64(), b.as_f64())),
    }
}

/// Returns the sum of all arguments. `(+)` is 0.
pub fn builtin_add(args: &[Value]) -> Result<Value, ErrorKind> {
    let mut sum = Num::Int(0);
    for position in 0..args.len() {
        let n = number("+", args, position)?;
        sum = combine(sum, n, i64::checked_add, |a, b| a + b);
    }
    Ok(sum.into_value())
}

/// Subtracts subsequent arguments from the first; negates a single argument.
pub fn builtin_sub(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.is_empty() {
        return Err(ErrorKind::arity_error("-", "at least one number", 0));
    }
    let first = number("-", args, 0)?;
    if args.len() == 1 {
        return Ok(combine(Num::Int(0), first, i64::checked_sub, |a, b| a - b).into_value());
    }
    let mut result = first;
    for position in 1..args.len() {
        let n = number("-", args, position)?;
        result = combine(result, n, i64::checked_sub, |a, b| a - b);
    }
    Ok(result.into_value())
}

/// Returns the product of all arguments. `(*)` is 1.
pub fn builtin_mul(args: &[Value]) -> Result<Value, ErrorKind> {
    let mut product = Num::Int(1);
    for position in 0..args.len() {
        let n = number("*", args, position)?;
        product = combine(product, n, i64::checked_mul, |a, b| a * b);
    }
    Ok(product.into_value())
}

/// Divides the first argument by the rest; a single argument yields its
/// reciprocal. Always produces a float.
pub fn builtin_div(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.is_empty() {
        return Err(ErrorKind::arity_error("/", "at least one number", 0));
    }
    let first = number("/", args, 0)?.as_f64();
    if args.len() == 1 {
        if first == 0.0 {
            return Err(ErrorKind::type_message("/", "division by zero"));
        }
        return Ok(Value::Float(1.0 / first));
    }
    let mut result = first;
    for position in 1..args.len() {
        let n = number("/", args, position)?.as_f64();
        if n == 0.0 {
            return Err(ErrorKind::type_message("/", "division by zero"));
        }
        result /= n;
    }
    Ok(Value::Float(result))
}

/// Register all arithmetic builtins in the environment.
pub fn register(env: &Rc<Environment>) {
    env.define("+".to_string(), Value::Builtin("+", builtin_add));
    env.define("-".to_string(), Value::Builtin("-", builtin_sub));
    env.define("*".to_string(), Value::Builtin("*", builtin_mul));
    env.define("/".to_string(), Value::Builtin("/", builtin_div));
}
