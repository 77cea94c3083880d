// ABOUTME: Destructuring bind of parameter/pattern trees against values

use crate::env::Environment;
use crate::form::Form;
use crate::value::Value;
use std::rc::Rc;

/// A pattern did not accept a value. `match` uses this to try the next
/// clause; function and macro calls convert it into an arity error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch;

pub type Bindings = Vec<(String, Value)>;

/// Binds `pattern` against `value`, producing the name/value pairs to
/// install. Patterns are symbols (bind the whole value), lists (bind
/// positionally, recursing into nested lists), or lists whose
/// second-to-last element is `&` (the final pattern binds the remaining
/// elements as a list, possibly empty).
pub fn bind(pattern: &Form, value: &Value) -> Result<Bindings, Mismatch> {
    let mut out = Vec::new();
    bind_into(pattern, value, &mut out)?;
    Ok(out)
}

fn bind_into(pattern: &Form, value: &Value, out: &mut Bindings) -> Result<(), Mismatch> {
    match pattern {
        Form::Symbol(name) => {
            out.push((name.clone(), value.clone()));
            Ok(())
        }
        Form::List(pats) => {
            let vals = match value {
                Value::List(vals) => vals,
                _ => return Err(Mismatch),
            };

            let rest_marker = pats.len() >= 2 && pats[pats.len() - 2].as_symbol() == Some("&");
            if rest_marker {
                let fixed = pats.len() - 2;
                if vals.len() < fixed {
                    return Err(Mismatch);
                }
                for (pat, val) in pats[..fixed].iter().zip(vals.iter()) {
                    bind_into(pat, val, out)?;
                }
                let rest = Value::List(vals[fixed..].to_vec());
                bind_into(&pats[pats.len() - 1], &rest, out)
            } else {
                if pats.len() != vals.len() {
                    return Err(Mismatch);
                }
                for (pat, val) in pats.iter().zip(vals.iter()) {
                    bind_into(pat, val, out)?;
                }
                Ok(())
            }
        }
        _ => Err(Mismatch),
    }
}

/// Installs bindings into a scope, in order. Later bindings of the same
/// name overwrite earlier ones.
pub fn install(scope: &Rc<Environment>, bindings: Bindings) {
    for (name, value) in bindings {
        scope.define(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().map(|n| Value::Int(*n)).collect())
    }

    #[test]
    fn test_symbol_binds_whole_value() {
        let bindings = bind(&Form::symbol("x"), &Value::Int(5)).unwrap();
        assert_eq!(bindings, vec![("x".to_string(), Value::Int(5))]);
    }

    #[test]
    fn test_positional_list_bind() {
        let pattern = Form::List(vec![Form::symbol("a"), Form::symbol("b")]);
        let bindings = bind(&pattern, &ints(&[1, 2])).unwrap();
        assert_eq!(
            bindings,
            vec![
                ("a".to_string(), Value::Int(1)),
                ("b".to_string(), Value::Int(2)),
            ]
        );
    }

    #[test]
    fn test_length_mismatch() {
        let pattern = Form::List(vec![Form::symbol("a"), Form::symbol("b")]);
        assert_eq!(bind(&pattern, &ints(&[1, 2, 3])), Err(Mismatch));
        assert_eq!(bind(&pattern, &ints(&[1])), Err(Mismatch));
    }

    #[test]
    fn test_non_list_value_mismatches_list_pattern() {
        let pattern = Form::List(vec![Form::symbol("a")]);
        assert_eq!(bind(&pattern, &Value::Int(1)), Err(Mismatch));
    }

    #[test]
    fn test_rest_binding() {
        let pattern = Form::List(vec![
            Form::symbol("head"),
            Form::symbol("&"),
            Form::symbol("tail"),
        ]);
        let bindings = bind(&pattern, &ints(&[1, 2, 3])).unwrap();
        assert_eq!(bindings[0], ("head".to_string(), Value::Int(1)));
        assert_eq!(bindings[1], ("tail".to_string(), ints(&[2, 3])));
    }

    #[test]
    fn test_rest_binding_accepts_empty_rest() {
        let pattern = Form::List(vec![
            Form::symbol("head"),
            Form::symbol("&"),
            Form::symbol("tail"),
        ]);
        let bindings = bind(&pattern, &ints(&[1])).unwrap();
        assert_eq!(bindings[1], ("tail".to_string(), Value::List(vec![])));
    }

    #[test]
    fn test_rest_requires_fixed_prefix() {
        let pattern = Form::List(vec![
            Form::symbol("a"),
            Form::symbol("b"),
            Form::symbol("&"),
            Form::symbol("rest"),
        ]);
        assert_eq!(bind(&pattern, &ints(&[1])), Err(Mismatch));
    }

    #[test]
    fn test_nested_list_pattern() {
        let pattern = Form::List(vec![
            Form::List(vec![Form::symbol("a"), Form::symbol("b")]),
            Form::symbol("c"),
        ]);
        let value = Value::List(vec![ints(&[1, 2]), Value::Int(3)]);
        let bindings = bind(&pattern, &value).unwrap();
        assert_eq!(
            bindings,
            vec![
                ("a".to_string(), Value::Int(1)),
                ("b".to_string(), Value::Int(2)),
                ("c".to_string(), Value::Int(3)),
            ]
        );
    }

    #[test]
    fn test_literal_pattern_never_matches() {
        assert_eq!(bind(&Form::Int(1), &Value::Int(1)), Err(Mismatch));
    }
}
