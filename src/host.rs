// ABOUTME: Host-runtime bridge: opaque handles, the HostBridge trait, and
// the bundled NativeBridge module registry

use crate::error::ErrorKind;
use crate::value::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// An opaque host value whose attributes are reachable via `.`. The
/// evaluator never looks inside the handle; only the bridge that minted
/// it can interpret it.
#[derive(Clone)]
pub struct HostObject {
    pub label: String,
    pub handle: Rc<dyn Any>,
}

impl HostObject {
    pub fn new(label: impl Into<String>, handle: Rc<dyn Any>) -> Self {
        HostObject {
            label: label.into(),
            handle,
        }
    }

    /// Host objects compare by identity.
    pub fn same(&self, other: &HostObject) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({})", self.label)
    }
}

/// An opaque handle to something the host runtime can invoke.
#[derive(Clone)]
pub struct HostCallable {
    pub label: String,
    pub handle: Rc<dyn Any>,
}

impl HostCallable {
    pub fn new(label: impl Into<String>, handle: Rc<dyn Any>) -> Self {
        HostCallable {
            label: label.into(),
            handle,
        }
    }

    pub fn same(&self, other: &HostCallable) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle)
    }
}

impl fmt::Debug for HostCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostCallable({})", self.label)
    }
}

/// The narrow interface the evaluator requires from its embedder. All
/// four operations are synchronous; failures surface as `ErrorKind::Host`.
pub trait HostBridge {
    /// Load a host module by dotted name.
    fn import_module(&self, dotted_name: &str) -> Result<Value, ErrorKind>;

    /// Attribute lookup on a host object.
    fn get_attr(&self, obj: &HostObject, name: &str) -> Result<Value, ErrorKind>;

    /// Invoke a host callable. The surface language has no kwarg syntax,
    /// so the evaluator always passes an empty map.
    fn call(
        &self,
        f: &HostCallable,
        args: &[Value],
        kwargs: &HashMap<String, Value>,
    ) -> Result<Value, ErrorKind>;

    /// Truthiness is delegated so host types behave naturally. The core
    /// rule treats only nil and false as falsy.
    fn is_truthy(&self, v: &Value) -> bool {
        v.is_truthy()
    }
}

// ============================================================================
// NativeBridge: the bundled host backed by a registry of built-in modules
// ============================================================================

struct NativeModule {
    attrs: HashMap<String, Value>,
}

/// The function type the NativeBridge stores behind `HostCallable` handles.
struct NativeFn {
    func: fn(&[Value]) -> Result<Value, ErrorKind>,
}

/// The default `HostBridge`: a registry of modules implemented in Rust.
/// Serves `pyimport`, `.`, and host calls for the REPL and tests.
pub struct NativeBridge {
    modules: HashMap<String, Rc<NativeModule>>,
}

impl NativeBridge {
    pub fn new() -> Self {
        let mut modules = HashMap::new();
        modules.insert("math".to_string(), Rc::new(math_module()));
        modules.insert("strings".to_string(), Rc::new(strings_module()));
        NativeBridge { modules }
    }
}

impl Default for NativeBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl HostBridge for NativeBridge {
    fn import_module(&self, dotted_name: &str) -> Result<Value, ErrorKind> {
        match self.modules.get(dotted_name) {
            Some(module) => Ok(Value::HostObject(HostObject::new(
                format!("module '{}'", dotted_name),
                module.clone() as Rc<dyn Any>,
            ))),
            None => Err(ErrorKind::host(format!("no module named '{}'", dotted_name))),
        }
    }

    fn get_attr(&self, obj: &HostObject, name: &str) -> Result<Value, ErrorKind> {
        let module = obj
            .handle
            .downcast_ref::<NativeModule>()
            .ok_or_else(|| ErrorKind::host(format!("{} has no attributes", obj.label)))?;
        module
            .attrs
            .get(name)
            .cloned()
            .ok_or_else(|| ErrorKind::host(format!("{} has no attribute '{}'", obj.label, name)))
    }

    fn call(
        &self,
        f: &HostCallable,
        args: &[Value],
        kwargs: &HashMap<String, Value>,
    ) -> Result<Value, ErrorKind> {
        if !kwargs.is_empty() {
            return Err(ErrorKind::host(format!(
                "{} does not accept keyword arguments",
                f.label
            )));
        }
        let native = f
            .handle
            .downcast_ref::<NativeFn>()
            .ok_or_else(|| ErrorKind::host(format!("{} is not a native callable", f.label)))?;
        (native.func)(args)
    }
}

fn callable(label: &str, func: fn(&[Value]) -> Result<Value, ErrorKind>) -> Value {
    Value::HostCallable(HostCallable::new(label, Rc::new(NativeFn { func })))
}

fn number_arg(label: &str, args: &[Value], position: usize) -> Result<f64, ErrorKind> {
    match args.get(position) {
        Some(Value::Int(n)) => Ok(*n as f64),
        Some(Value::Float(n)) => Ok(*n),
        Some(other) => Err(ErrorKind::type_error(label, "number", other, position + 1)),
        None => Err(ErrorKind::host(format!(
            "{}: missing argument {}",
            label,
            position + 1
        ))),
    }
}

fn string_arg(label: &str, args: &[Value], position: usize) -> Result<String, ErrorKind> {
    match args.get(position) {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(other) => Err(ErrorKind::type_error(label, "string", other, position + 1)),
        None => Err(ErrorKind::host(format!(
            "{}: missing argument {}",
            label,
            position + 1
        ))),
    }
}

fn math_module() -> NativeModule {
    let mut attrs = HashMap::new();
    attrs.insert("pi".to_string(), Value::Float(std::f64::consts::PI));
    attrs.insert("e".to_string(), Value::Float(std::f64::consts::E));
    attrs.insert(
        "sqrt".to_string(),
        callable("math.sqrt", |args| {
            Ok(Value::Float(number_arg("math.sqrt", args, 0)?.sqrt()))
        }),
    );
    attrs.insert(
        "pow".to_string(),
        callable("math.pow", |args| {
            let base = number_arg("math.pow", args, 0)?;
            let exp = number_arg("math.pow", args, 1)?;
            Ok(Value::Float(base.powf(exp)))
        }),
    );
    attrs.insert(
        "abs".to_string(),
        callable("math.abs", |args| match args.first() {
            Some(Value::Int(n)) => Ok(Value::Int(n.abs())),
            _ => Ok(Value::Float(number_arg("math.abs", args, 0)?.abs())),
        }),
    );
    attrs.insert(
        "floor".to_string(),
        callable("math.floor", |args| {
            Ok(Value::Int(number_arg("math.floor", args, 0)?.floor() as i64))
        }),
    );
    NativeModule { attrs }
}

fn strings_module() -> NativeModule {
    let mut attrs = HashMap::new();
    attrs.insert(
        "upper".to_string(),
        callable("strings.upper", |args| {
            Ok(Value::Str(string_arg("strings.upper", args, 0)?.to_uppercase()))
        }),
    );
    attrs.insert(
        "lower".to_string(),
        callable("strings.lower", |args| {
            Ok(Value::Str(string_arg("strings.lower", args, 0)?.to_lowercase()))
        }),
    );
    attrs.insert(
        "trim".to_string(),
        callable("strings.trim", |args| {
            Ok(Value::Str(string_arg("strings.trim", args, 0)?.trim().to_string()))
        }),
    );
    attrs.insert(
        "split".to_string(),
        callable("strings.split", |args| {
            let text = string_arg("strings.split", args, 0)?;
            let sep = string_arg("strings.split", args, 1)?;
            Ok(Value::List(
                text.split(sep.as_str())
                    .map(|part| Value::Str(part.to_string()))
                    .collect(),
            ))
        }),
    );
    NativeModule { attrs }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_known_module() {
        let bridge = NativeBridge::new();
        match bridge.import_module("math") {
            Ok(Value::HostObject(obj)) => assert_eq!(obj.label, "module 'math'"),
            other => panic!("expected host object, got {:?}", other),
        }
    }

    #[test]
    fn test_import_unknown_module_fails() {
        let bridge = NativeBridge::new();
        assert!(matches!(
            bridge.import_module("nope"),
            Err(ErrorKind::Host(_))
        ));
    }

    #[test]
    fn test_get_attr_and_call() {
        let bridge = NativeBridge::new();
        let module = match bridge.import_module("math") {
            Ok(Value::HostObject(obj)) => obj,
            other => panic!("expected host object, got {:?}", other),
        };

        match bridge.get_attr(&module, "pi") {
            Ok(Value::Float(pi)) => assert!((pi - std::f64::consts::PI).abs() < 1e-12),
            other => panic!("expected pi, got {:?}", other),
        }

        let sqrt = match bridge.get_attr(&module, "sqrt") {
            Ok(Value::HostCallable(f)) => f,
            other => panic!("expected callable, got {:?}", other),
        };
        let result = bridge
            .call(&sqrt, &[Value::Int(9)], &HashMap::new())
            .unwrap();
        match result {
            Value::Float(n) => assert!((n - 3.0).abs() < 1e-12),
            other => panic!("expected 3.0, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_attr_fails() {
        let bridge = NativeBridge::new();
        let module = match bridge.import_module("strings") {
            Ok(Value::HostObject(obj)) => obj,
            other => panic!("expected host object, got {:?}", other),
        };
        assert!(matches!(
            bridge.get_attr(&module, "missing"),
            Err(ErrorKind::Host(_))
        ));
    }
}
