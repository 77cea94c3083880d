// ABOUTME: Environment module for managing variable bindings and scopes

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One scope in a parent-linked chain. Lookup walks from the innermost
/// scope outward; the first binding found wins. Closures share parent
/// references, so a scope lives as long as any closure captures it.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a root environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a child scope. Used for `let`, `match` arms, and call frames.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Defines a binding in THIS scope. A second binding of the same
    /// name in one scope overwrites the first.
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Defines a binding in the ROOT scope, overwriting if present.
    /// `def`, `defn`, `defmacro`, and `pyimport` bind here regardless of
    /// how deeply nested the defining form is.
    pub fn define_root(&self, name: String, value: Value) {
        match &self.parent {
            Some(parent) => parent.define_root(name, value),
            None => self.define(name, value),
        }
    }

    /// Looks up a symbol in this scope and parent scopes recursively.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }

        if let Some(ref parent) = self.parent {
            return parent.get(name);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Int(42));

        match env.get("x") {
            Some(Value::Int(n)) => assert_eq!(n, 42),
            _ => panic!("Expected Int(42)"),
        }
    }

    #[test]
    fn test_undefined_symbol() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Int(42));

        let child = Environment::with_parent(parent.clone());
        child.define("x".to_string(), Value::Int(100));

        // Child sees its own value, parent keeps its binding
        match child.get("x") {
            Some(Value::Int(n)) => assert_eq!(n, 100),
            _ => panic!("Expected Int(100)"),
        }
        match parent.get("x") {
            Some(Value::Int(n)) => assert_eq!(n, 42),
            _ => panic!("Expected Int(42)"),
        }
    }

    #[test]
    fn test_parent_lookup() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Int(42));

        let child = Environment::with_parent(parent);

        match child.get("x") {
            Some(Value::Int(n)) => assert_eq!(n, 42),
            _ => panic!("Expected Int(42)"),
        }
    }

    #[test]
    fn test_define_root_walks_to_root() {
        let root = Environment::new();
        let middle = Environment::with_parent(root.clone());
        let inner = Environment::with_parent(middle.clone());

        inner.define_root("x".to_string(), Value::Int(7));

        // Binding landed at the root, not in the defining scope
        match root.get("x") {
            Some(Value::Int(n)) => assert_eq!(n, 7),
            _ => panic!("Expected Int(7) at root"),
        }
        assert!(inner.get("x").is_some());
    }

    #[test]
    fn test_define_root_overwrites_builtins() {
        let root = Environment::new();
        root.define("len".to_string(), Value::Int(1));

        let child = Environment::with_parent(root.clone());
        child.define_root("len".to_string(), Value::Int(2));

        match root.get("len") {
            Some(Value::Int(n)) => assert_eq!(n, 2),
            _ => panic!("Expected Int(2)"),
        }
    }
}
