//! List operations: list, first, rest, cons, concat, len, range
//!
//! Lists are plain vectors; every operation returns a new list and
//! leaves its arguments untouched. `rest` of an empty list is the empty
//! list, so recursions can bottom out without a guard; `first` of an
//! empty list is an error.

use crate::env::Environment;
use crate::error::ErrorKind;
use crate::value::Value;
use std::rc::Rc;

fn list_arg<'a>(function: &str, args: &'a [Value], position: usize) -> Result<&'a [Value], ErrorKind> {
    match &args[position] {
        Value::List(items) => Ok(items),
        other => Err(ErrorKind::type_error(function, "list", other, position + 1)),
    }
}

fn int_arg(function: &str, args: &[Value], position: usize) -> Result<i64, ErrorKind> {
    match &args[position] {
        Value::Int(n) => Ok(*n),
        other => Err(ErrorKind::type_error(function, "int", other, position + 1)),
    }
}

/// Creates a new list containing the given elements in order.
pub fn builtin_list(args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(Value::List(args.to_vec()))
}

/// Returns the first element of a list.
pub fn builtin_first(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() != 1 {
        return Err(ErrorKind::arity_error("first", "one list", args.len()));
    }
    let items = list_arg("first", args, 0)?;
    items
        .first()
        .cloned()
        .ok_or_else(|| ErrorKind::type_message("first", "empty list"))
}

/// Returns all elements except the first; the empty list stays empty.
pub fn builtin_rest(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() != 1 {
        return Err(ErrorKind::arity_error("rest", "one list", args.len()));
    }
    let items = list_arg("rest", args, 0)?;
    if items.is_empty() {
        Ok(Value::List(Vec::new()))
    } else {
        Ok(Value::List(items[1..].to_vec()))
    }
}

/// Constructs a new list by prepending an element to a list.
pub fn builtin_cons(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() != 2 {
        return Err(ErrorKind::arity_error("cons", "an element and a list", args.len()));
    }
    let tail = list_arg("cons", args, 1)?;
    let mut result = Vec::with_capacity(tail.len() + 1);
    result.push(args[0].clone());
    result.extend(tail.iter().cloned());
    Ok(Value::List(result))
}

/// Concatenates lists, or strings.
pub fn builtin_concat(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.iter().all(|arg| matches!(arg, Value::Str(_))) && !args.is_empty() {
        let mut out = String::new();
        for arg in args {
            if let Value::Str(s) = arg {
                out.push_str(s);
            }
        }
        return Ok(Value::Str(out));
    }
    let mut out = Vec::new();
    for position in 0..args.len() {
        out.extend(list_arg("concat", args, position)?.iter().cloned());
    }
    Ok(Value::List(out))
}

/// Number of elements in a list or characters in a string.
pub fn builtin_len(args: &[Value]) -> Result<Value, ErrorKind> {
    if args.len() != 1 {
        return Err(ErrorKind::arity_error("len", "one list or string", args.len()));
    }
    match &args[0] {
        Value::List(items) => Ok(Value::Int(items.len() as i64)),
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        other => Err(ErrorKind::type_error("len", "list or string", other, 1)),
    }
}

/// `(range n)`, `(range start stop)`, or `(range start stop step)`.
pub fn builtin_range(args: &[Value]) -> Result<Value, ErrorKind> {
    let (start, stop, step) = match args.len() {
        1 => (0, int_arg("range", args, 0)?, 1),
        2 => (int_arg("range", args, 0)?, int_arg("range", args, 1)?, 1),
        3 => (
            int_arg("range", args, 0)?,
            int_arg("range", args, 1)?,
            int_arg("range", args, 2)?,
        ),
        n => return Err(ErrorKind::arity_error("range", "one to three ints", n)),
    };
    if step == 0 {
        return Err(ErrorKind::type_message("range", "step must not be zero"));
    }
    let mut out = Vec::new();
    let mut current = start;
    while (step > 0 && current < stop) || (step < 0 && current > stop) {
        out.push(Value::Int(current));
        current += step;
    }
    Ok(Value::List(out))
}

/// Register all list builtins in the environment.
pub fn register(env: &Rc<Environment>) {
    env.define("list".to_string(), Value::Builtin("list", builtin_list));
    env.define("first".to_string(), Value::Builtin("first", builtin_first));
    env.define("rest".to_string(), Value::Builtin("rest", builtin_rest));
    env.define("cons".to_string(), Value::Builtin("cons", builtin_cons));
    env.define("concat".to_string(), Value::Builtin("concat", builtin_concat));
    env.define("len".to_string(), Value::Builtin("len", builtin_len));
    env.define("range".to_string(), Value::Builtin("range", builtin_range));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().map(|n| Value::Int(*n)).collect())
    }

    #[test]
    fn test_list_and_first_rest() {
        let list = builtin_list(&[Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(builtin_first(&[list.clone()]).unwrap(), Value::Int(1));
        assert_eq!(builtin_rest(&[list]).unwrap(), ints(&[2]));
    }

    #[test]
    fn test_first_of_empty_is_error() {
        assert!(builtin_first(&[Value::List(vec![])]).is_err());
    }

    #[test]
    fn test_rest_of_empty_is_empty() {
        assert_eq!(
            builtin_rest(&[Value::List(vec![])]).unwrap(),
            Value::List(vec![])
        );
    }

    #[test]
    fn test_cons() {
        assert_eq!(
            builtin_cons(&[Value::Int(1), ints(&[2, 3])]).unwrap(),
            ints(&[1, 2, 3])
        );
        assert!(builtin_cons(&[Value::Int(1), Value::Int(2)]).is_err());
    }

    #[test]
    fn test_concat_lists_and_strings() {
        assert_eq!(
            builtin_concat(&[ints(&[1]), ints(&[2, 3])]).unwrap(),
            ints(&[1, 2, 3])
        );
        assert_eq!(
            builtin_concat(&[Value::Str("ab".to_string()), Value::Str("cd".to_string())]).unwrap(),
            Value::Str("abcd".to_string())
        );
        assert_eq!(builtin_concat(&[]).unwrap(), Value::List(vec![]));
    }

    #[test]
    fn test_len() {
        assert_eq!(builtin_len(&[ints(&[1, 2, 3])]).unwrap(), Value::Int(3));
        assert_eq!(
            builtin_len(&[Value::Str("abcd".to_string())]).unwrap(),
            Value::Int(4)
        );
        assert!(builtin_len(&[Value::Int(1)]).is_err());
    }

    #[test]
    fn test_range() {
        assert_eq!(builtin_range(&[Value::Int(3)]).unwrap(), ints(&[0, 1, 2]));
        assert_eq!(
            builtin_range(&[Value::Int(2), Value::Int(5)]).unwrap(),
            ints(&[2, 3, 4])
        );
        assert_eq!(
            builtin_range(&[Value::Int(5), Value::Int(0), Value::Int(-2)]).unwrap(),
            ints(&[5, 3, 1])
        );
        assert!(builtin_range(&[Value::Int(1), Value::Int(2), Value::Int(0)]).is_err());
    }
}
