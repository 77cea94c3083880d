// ABOUTME: Interpreter driver: root environment bootstrap and program evaluation

use crate::builtins::register_builtins;
use crate::env::Environment;
use crate::error::LispError;
use crate::eval::evaluate;
use crate::form::Form;
use crate::host::{HostBridge, NativeBridge};
use crate::parser;
use crate::value::Value;
use std::rc::Rc;

/// The bootstrap standard library, written in the language itself and
/// evaluated against the fresh root environment at construction.
const STDLIB: &str = include_str!("stdlib.lisp");

/// An evaluator instance: the root environment (builtins plus top-level
/// definitions) and the host bridge it talks to. Single-threaded; the
/// root scope is only ever mutated by the engine loop.
pub struct Interpreter {
    root: Rc<Environment>,
    bridge: Rc<dyn HostBridge>,
}

impl Interpreter {
    /// Builds an interpreter with the bundled native bridge and the
    /// bootstrap stdlib loaded.
    pub fn new() -> Result<Interpreter, LispError> {
        Self::with_bridge(Rc::new(NativeBridge::new()))
    }

    /// Builds an interpreter over a custom host bridge, stdlib included.
    pub fn with_bridge(bridge: Rc<dyn HostBridge>) -> Result<Interpreter, LispError> {
        let interp = Self::bare(bridge);
        interp.eval_str(STDLIB)?;
        Ok(interp)
    }

    /// Builds an interpreter with builtins only, skipping the stdlib.
    pub fn bare(bridge: Rc<dyn HostBridge>) -> Interpreter {
        let root = Environment::new();
        register_builtins(&root);
        Interpreter { root, bridge }
    }

    /// Parses a program and evaluates its forms in order, returning the
    /// last value (nil for an empty program).
    pub fn eval_str(&self, source: &str) -> Result<Value, LispError> {
        let forms = parser::parse_program(source).map_err(LispError::from)?;
        let mut last = Value::Nil;
        for form in &forms {
            last = evaluate(form, &self.root, self.bridge.as_ref())?;
        }
        Ok(last)
    }

    /// Evaluates a single already-parsed form.
    pub fn eval_form(&self, form: &Form) -> Result<Value, LispError> {
        evaluate(form, &self.root, self.bridge.as_ref())
    }

    pub fn root(&self) -> &Rc<Environment> {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpreter_evaluates_programs() {
        let interp = Interpreter::new().unwrap();
        assert_eq!(interp.eval_str("(+ 1 2 3)").unwrap(), Value::Int(6));
        assert_eq!(interp.eval_str("").unwrap(), Value::Nil);
    }

    #[test]
    fn test_definitions_persist_across_eval_str_calls() {
        let interp = Interpreter::new().unwrap();
        interp.eval_str("(def x 41)").unwrap();
        assert_eq!(interp.eval_str("(inc x)").unwrap(), Value::Int(42));
    }

    #[test]
    fn test_stdlib_is_loaded() {
        let interp = Interpreter::new().unwrap();
        assert_eq!(interp.eval_str("(inc 1)").unwrap(), Value::Int(2));
        assert_eq!(
            interp.eval_str("(map inc (list 1 2 3))").unwrap(),
            Value::List(vec![Value::Int(2), Value::Int(3), Value::Int(4)])
        );
    }

    #[test]
    fn test_bare_interpreter_has_no_stdlib() {
        let interp = Interpreter::bare(Rc::new(NativeBridge::new()));
        assert!(interp.eval_str("(inc 1)").is_err());
        assert_eq!(interp.eval_str("(+ 1 1)").unwrap(), Value::Int(2));
    }
}
