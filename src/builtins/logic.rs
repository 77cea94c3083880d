//! Logic operations: not, and, or
//!
//! These are ordinary builtins, so their arguments are evaluated
//! strictly and left-to-right before the operator sees them. All three
//! return booleans under the core truthiness rule (only nil and false
//! are falsy).

use crate::env::Environment;
use crate::error::ErrorKind;
use crate::value::Value;
use std::rc::Rc;

pub fn builtin_not(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() != 1 {
        return Err(ErrorKind::arity_error("not", "one value", args.len()));
    }
    Ok(Value::Bool(!args[0].is_truthy()))
}

/// `(and)` is true.
pub fn builtin_and(args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(Value::Bool(args.iter().all(Value::is_truthy)))
}

/// `(or)` is false.
pub fn builtin_or(args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(Value::Bool(args.iter().any(Value::is_truthy)))
}

/// Register all logic builtins in the environment.
pub fn register(env: &Rc<Environment>) {
    env.define("not".to_string(), Value::Builtin("not", builtin_not));
    env.define("and".to_string(), Value::Builtin("and", builtin_and));
    env.define("or".to_string(), Value::Builtin("or", builtin_or));
}
