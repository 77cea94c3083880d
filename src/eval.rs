// ABOUTME: Iterative evaluator: an explicit frame stack drives special-form
// dispatch, macro expansion, and function application without host recursion

use crate::destructure::{self, Bindings, Mismatch};
use crate::env::Environment;
use crate::error::{ErrorKind, LispError};
use crate::form::Form;
use crate::host::HostBridge;
use crate::trace::CallTrace;
use crate::value::{lower, reify, Closure, Value};
use std::collections::HashMap;
use std::rc::Rc;

/// Evaluates one form to completion. Host-stack depth stays constant in
/// user recursion depth; only the heap-allocated frame stack grows.
pub fn evaluate(
    form: &Form,
    env: &Rc<Environment>,
    bridge: &dyn HostBridge,
) -> Result<Value, LispError> {
    Machine::new(form.clone(), env.clone(), bridge).run()
}

/// What a frame asks the engine to do next.
enum Step {
    /// Pop this frame; its value goes to the result register.
    Done(Value),
    /// Push a child frame; resume this one with the child's value.
    Suspend(Form, Rc<Environment>),
    /// Replace this frame. Tail positions never accumulate frames.
    Tail(Form, Rc<Environment>),
    /// Unwind the whole stack.
    Fail(ErrorKind),
}

/// Per-form state machine position, holding any partial results
/// accumulated so far. Pending work is stored reversed so the next item
/// is a `pop()` from the back.
enum State {
    Enter,
    IfTest {
        then_branch: Form,
        else_branch: Option<Form>,
    },
    LetBind {
        pattern: Form,
        pending: Vec<(Form, Form)>,
        body: Vec<Form>,
        scope: Rc<Environment>,
    },
    DefBind {
        name: String,
        pending: Vec<(String, Form)>,
    },
    Seq {
        pending: Vec<Form>,
    },
    Quote {
        templates: Vec<Form>,
        pending: Vec<Form>,
        results: Vec<Value>,
    },
    DynamicLookup,
    AttrGet {
        attr: String,
    },
    MatchArms {
        clauses: Vec<(Form, Form)>,
    },
    CallHead {
        args: Vec<Form>,
    },
    CallArgs {
        callee: Value,
        pending: Vec<Form>,
        results: Vec<Value>,
    },
    ExpandMacro {
        reenter: bool,
    },
}

/// One suspended evaluation on the engine stack.
struct Frame {
    form: Form,
    env: Rc<Environment>,
    state: State,
    /// Human-readable context for the call trace, e.g. the function name
    /// and bound-parameter snapshot of a call frame.
    context: Option<String>,
}

fn missing_input() -> Step {
    Step::Fail(ErrorKind::internal("frame resumed without a value"))
}

impl Frame {
    fn new(form: Form, env: Rc<Environment>) -> Frame {
        Frame {
            form,
            env,
            state: State::Enter,
            context: None,
        }
    }

    /// Advances the state machine one step, consuming the child result
    /// when resuming after a `Suspend`.
    fn advance(&mut self, input: Option<Value>, bridge: &dyn HostBridge) -> Step {
        let state = std::mem::replace(&mut self.state, State::Enter);
        match state {
            State::Enter => self.enter(bridge),

            State::IfTest {
                then_branch,
                else_branch,
            } => {
                let test = match input {
                    Some(v) => v,
                    None => return missing_input(),
                };
                if bridge.is_truthy(&test) {
                    Step::Tail(then_branch, self.env.clone())
                } else if let Some(else_branch) = else_branch {
                    Step::Tail(else_branch, self.env.clone())
                } else {
                    Step::Done(Value::Nil)
                }
            }

            State::LetBind {
                pattern,
                mut pending,
                body,
                scope,
            } => {
                let value = match input {
                    Some(v) => v,
                    None => return missing_input(),
                };
                match destructure::bind(&pattern, &value) {
                    Ok(bindings) => destructure::install(&scope, bindings),
                    Err(Mismatch) => {
                        return Step::Fail(ErrorKind::type_message(
                            "let",
                            format!("cannot destructure {} against pattern {}", value, pattern),
                        ))
                    }
                }
                match pending.pop() {
                    Some((next_pattern, init)) => {
                        self.state = State::LetBind {
                            pattern: next_pattern,
                            pending,
                            body,
                            scope: scope.clone(),
                        };
                        // later inits see the bindings accumulated so far
                        Step::Suspend(init, scope)
                    }
                    None => {
                        self.env = scope;
                        self.begin_seq(body)
                    }
                }
            }

            State::DefBind { name, mut pending } => {
                let value = match input {
                    Some(v) => v,
                    None => return missing_input(),
                };
                self.env.define_root(name, value.clone());
                match pending.pop() {
                    Some((next_name, init)) => {
                        self.state = State::DefBind {
                            name: next_name,
                            pending,
                        };
                        Step::Suspend(init, self.env.clone())
                    }
                    None => Step::Done(value),
                }
            }

            State::Seq { mut pending } => {
                // intermediate results are discarded
                let next = match pending.pop() {
                    Some(form) => form,
                    None => return Step::Fail(ErrorKind::internal("empty sequence frame")),
                };
                if pending.is_empty() {
                    Step::Tail(next, self.env.clone())
                } else {
                    self.state = State::Seq { pending };
                    Step::Suspend(next, self.env.clone())
                }
            }

            State::Quote {
                templates,
                mut pending,
                mut results,
            } => {
                let value = match input {
                    Some(v) => v,
                    None => return missing_input(),
                };
                results.push(value);
                match pending.pop() {
                    Some(next) => {
                        self.state = State::Quote {
                            templates,
                            pending,
                            results,
                        };
                        Step::Suspend(next, self.env.clone())
                    }
                    None => finish_quote(templates, results),
                }
            }

            State::DynamicLookup => {
                let value = match input {
                    Some(v) => v,
                    None => return missing_input(),
                };
                match value {
                    Value::Str(name) => match self.env.get(&name) {
                        Some(bound) => Step::Done(bound),
                        None => Step::Fail(ErrorKind::Name(name)),
                    },
                    other => Step::Fail(ErrorKind::type_error("$", "string", &other, 1)),
                }
            }

            State::AttrGet { attr } => {
                let value = match input {
                    Some(v) => v,
                    None => return missing_input(),
                };
                match value {
                    Value::HostObject(obj) => match bridge.get_attr(&obj, &attr) {
                        Ok(found) => Step::Done(found),
                        Err(kind) => Step::Fail(kind),
                    },
                    other => Step::Fail(ErrorKind::type_error(".", "host object", &other, 1)),
                }
            }

            State::MatchArms { clauses } => {
                let value = match input {
                    Some(v) => v,
                    None => return missing_input(),
                };
                for (pattern, result) in clauses {
                    if let Ok(bindings) = destructure::bind(&pattern, &value) {
                        let scope = Environment::with_parent(self.env.clone());
                        destructure::install(&scope, bindings);
                        return Step::Tail(result, scope);
                    }
                }
                Step::Fail(ErrorKind::MatchFailed(value.to_string()))
            }

            State::CallHead { args } => {
                let callee = match input {
                    Some(v) => v,
                    None => return missing_input(),
                };
                // Macros receive their argument forms unevaluated
                if let Value::Macro(mac) = callee {
                    return self.begin_macro(mac, args, true);
                }
                let mut pending = args;
                pending.reverse();
                match pending.pop() {
                    Some(first) => {
                        self.state = State::CallArgs {
                            callee,
                            pending,
                            results: Vec::new(),
                        };
                        Step::Suspend(first, self.env.clone())
                    }
                    None => self.apply(callee, Vec::new(), bridge),
                }
            }

            State::CallArgs {
                callee,
                mut pending,
                mut results,
            } => {
                let value = match input {
                    Some(v) => v,
                    None => return missing_input(),
                };
                results.push(value);
                match pending.pop() {
                    Some(next) => {
                        self.state = State::CallArgs {
                            callee,
                            pending,
                            results,
                        };
                        Step::Suspend(next, self.env.clone())
                    }
                    None => self.apply(callee, results, bridge),
                }
            }

            State::ExpandMacro { reenter } => {
                let expansion = match input {
                    Some(v) => v,
                    None => return missing_input(),
                };
                if reenter {
                    match reify(&expansion) {
                        // re-enter the expansion in the call-site environment
                        Ok(form) => Step::Tail(form, self.env.clone()),
                        Err(_) => Step::Fail(ErrorKind::type_message(
                            "macro",
                            format!("expansion is not code: {}", expansion.type_name()),
                        )),
                    }
                } else {
                    Step::Done(expansion)
                }
            }
        }
    }

    /// Initial dispatch on the form under evaluation.
    fn enter(&mut self, bridge: &dyn HostBridge) -> Step {
        match &self.form {
            Form::Int(_) | Form::Float(_) | Form::Str(_) | Form::Bool(_) | Form::Nil => {
                Step::Done(lower(&self.form))
            }
            Form::Symbol(name) => match self.env.get(name) {
                Some(value) => Step::Done(value),
                None => Step::Fail(ErrorKind::Name(name.clone())),
            },
            Form::Quoted(inner) => {
                let templates = vec![(**inner).clone()];
                self.begin_quote(templates)
            }
            Form::Unquoted(_) => Step::Fail(ErrorKind::type_message(
                "~",
                "unquote escape outside of a quoted form",
            )),
            Form::List(items) if items.is_empty() => Step::Done(Value::List(Vec::new())),
            Form::List(items) => {
                let items = items.clone();
                // Special forms win over any binding of the same name
                match items[0].as_symbol() {
                    Some("if") => self.enter_if(items),
                    Some("let") => self.enter_let(items),
                    Some("def") => self.enter_def(items),
                    Some("defn") => self.enter_defn(items),
                    Some("fn") => self.enter_fn(items),
                    Some("#") => self.enter_shorthand_fn(items),
                    Some("do") => self.enter_do(items),
                    Some("quote") => self.enter_quote(items),
                    Some("comment") => Step::Done(Value::Nil),
                    Some(".") => self.enter_attr(items),
                    Some("$") => self.enter_dynamic(items),
                    Some("pyimport") => self.enter_pyimport(items, bridge),
                    Some("pyimport_from") => self.enter_pyimport_from(items, bridge),
                    Some("defmacro") => self.enter_defmacro(items),
                    Some("match") => self.enter_match(items),
                    _ => self.enter_call(items),
                }
            }
        }
    }

    fn enter_if(&mut self, items: Vec<Form>) -> Step {
        if items.len() < 3 || items.len() > 4 {
            return Step::Fail(ErrorKind::type_message(
                "if",
                "expected a test, a then-branch, and an optional else-branch",
            ));
        }
        let test = items[1].clone();
        self.state = State::IfTest {
            then_branch: items[2].clone(),
            else_branch: items.get(3).cloned(),
        };
        Step::Suspend(test, self.env.clone())
    }

    fn enter_let(&mut self, items: Vec<Form>) -> Step {
        if items.len() < 3 {
            return Step::Fail(ErrorKind::type_message(
                "let",
                "expected a binding list and a body",
            ));
        }
        let mut pending = match items[1].as_list() {
            Some(entries) if entries.len() % 2 == 0 => entries
                .chunks(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect::<Vec<_>>(),
            _ => {
                return Step::Fail(ErrorKind::type_message(
                    "let",
                    "bindings must be a list of pattern/value pairs",
                ))
            }
        };
        let body = items[2..].to_vec();
        let scope = Environment::with_parent(self.env.clone());
        pending.reverse();
        match pending.pop() {
            Some((pattern, init)) => {
                self.state = State::LetBind {
                    pattern,
                    pending,
                    body,
                    scope: scope.clone(),
                };
                Step::Suspend(init, scope)
            }
            None => {
                self.env = scope;
                self.begin_seq(body)
            }
        }
    }

    fn enter_def(&mut self, items: Vec<Form>) -> Step {
        if items.len() < 3 || items.len() % 2 == 0 {
            return Step::Fail(ErrorKind::type_message("def", "expected name/value pairs"));
        }
        let mut pending = Vec::new();
        for pair in items[1..].chunks(2) {
            match pair[0].as_symbol() {
                Some(name) => pending.push((name.to_string(), pair[1].clone())),
                None => {
                    return Step::Fail(ErrorKind::type_message(
                        "def",
                        format!("cannot bind to {}", pair[0]),
                    ))
                }
            }
        }
        pending.reverse();
        match pending.pop() {
            Some((name, init)) => {
                self.state = State::DefBind { name, pending };
                Step::Suspend(init, self.env.clone())
            }
            None => Step::Done(Value::Nil),
        }
    }

    fn enter_defn(&mut self, items: Vec<Form>) -> Step {
        if items.len() < 4 {
            return Step::Fail(ErrorKind::type_message(
                "defn",
                "expected a name, a parameter list, and a body",
            ));
        }
        let name = match items[1].as_symbol() {
            Some(name) => name.to_string(),
            None => {
                return Step::Fail(ErrorKind::type_message("defn", "name must be a symbol"))
            }
        };
        if items[2].as_list().is_none() {
            return Step::Fail(ErrorKind::type_message("defn", "parameters must be a list"));
        }
        let closure = Closure {
            name: Some(name.clone()),
            params: items[2].clone(),
            body: Form::body_of(items[3..].to_vec()),
            env: self.env.clone(),
        };
        let value = Value::Fn(Rc::new(closure));
        self.env.define_root(name, value.clone());
        Step::Done(value)
    }

    fn enter_fn(&mut self, items: Vec<Form>) -> Step {
        if items.len() < 3 {
            return Step::Fail(ErrorKind::type_message(
                "fn",
                "expected a parameter list and a body",
            ));
        }
        if items[1].as_list().is_none() {
            return Step::Fail(ErrorKind::type_message("fn", "parameters must be a list"));
        }
        let closure = Closure {
            name: None,
            params: items[1].clone(),
            body: Form::body_of(items[2..].to_vec()),
            env: self.env.clone(),
        };
        Step::Done(Value::Fn(Rc::new(closure)))
    }

    /// `(# body...)`: anonymous function whose arity is inferred from the
    /// largest `%i` placeholder in the body.
    fn enter_shorthand_fn(&mut self, items: Vec<Form>) -> Step {
        let body = items[1..].to_vec();
        let arity = body
            .iter()
            .filter_map(max_placeholder)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0);
        let params = (0..arity).map(|i| Form::Symbol(format!("%{}", i))).collect();
        let closure = Closure {
            name: None,
            params: Form::List(params),
            body: Form::body_of(body),
            env: self.env.clone(),
        };
        Step::Done(Value::Fn(Rc::new(closure)))
    }

    fn enter_do(&mut self, items: Vec<Form>) -> Step {
        if items.len() == 1 {
            Step::Done(Value::Nil)
        } else {
            self.begin_seq(items[1..].to_vec())
        }
    }

    fn enter_quote(&mut self, items: Vec<Form>) -> Step {
        if items.len() == 1 {
            return Step::Done(Value::Nil);
        }
        self.begin_quote(items[1..].to_vec())
    }

    fn enter_attr(&mut self, items: Vec<Form>) -> Step {
        if items.len() != 3 {
            return Step::Fail(ErrorKind::type_message(
                ".",
                "expected an object and an attribute name",
            ));
        }
        let attr = match items[2].as_symbol() {
            Some(attr) => attr.to_string(),
            None => {
                return Step::Fail(ErrorKind::type_message(
                    ".",
                    "attribute name must be a bare symbol",
                ))
            }
        };
        self.state = State::AttrGet { attr };
        Step::Suspend(items[1].clone(), self.env.clone())
    }

    fn enter_dynamic(&mut self, items: Vec<Form>) -> Step {
        if items.len() != 2 {
            return Step::Fail(ErrorKind::type_message("$", "expected one operand"));
        }
        self.state = State::DynamicLookup;
        Step::Suspend(items[1].clone(), self.env.clone())
    }

    fn enter_pyimport(&mut self, items: Vec<Form>, bridge: &dyn HostBridge) -> Step {
        if items.len() < 2 {
            return Step::Fail(ErrorKind::type_message(
                "pyimport",
                "expected at least one module name",
            ));
        }
        for item in &items[1..] {
            let name = match item.as_symbol() {
                Some(name) => name,
                None => {
                    return Step::Fail(ErrorKind::type_message(
                        "pyimport",
                        format!("module name must be a symbol, got {}", item),
                    ))
                }
            };
            let module = match bridge.import_module(name) {
                Ok(module) => module,
                Err(kind) => return Step::Fail(kind),
            };
            // bind `os.path` under `path`
            let leaf = name.rsplit('.').next().unwrap_or(name);
            self.env.define_root(leaf.to_string(), module);
        }
        Step::Done(Value::Nil)
    }

    fn enter_pyimport_from(&mut self, items: Vec<Form>, bridge: &dyn HostBridge) -> Step {
        if items.len() != 3 {
            return Step::Fail(ErrorKind::type_message(
                "pyimport_from",
                "expected a module and an attribute name",
            ));
        }
        let (module_name, attr) = match (items[1].as_symbol(), items[2].as_symbol()) {
            (Some(module_name), Some(attr)) => (module_name, attr),
            _ => {
                return Step::Fail(ErrorKind::type_message(
                    "pyimport_from",
                    "module and attribute names must be symbols",
                ))
            }
        };
        let module = match bridge.import_module(module_name) {
            Ok(module) => module,
            Err(kind) => return Step::Fail(kind),
        };
        let obj = match module {
            Value::HostObject(obj) => obj,
            other => {
                return Step::Fail(ErrorKind::host(format!(
                    "module '{}' imported as {}",
                    module_name,
                    other.type_name()
                )))
            }
        };
        let value = match bridge.get_attr(&obj, attr) {
            Ok(value) => value,
            Err(kind) => return Step::Fail(kind),
        };
        self.env.define_root(attr.to_string(), value);
        Step::Done(Value::Nil)
    }

    fn enter_defmacro(&mut self, items: Vec<Form>) -> Step {
        if items.len() < 4 {
            return Step::Fail(ErrorKind::type_message(
                "defmacro",
                "expected a name, a parameter list, and a body",
            ));
        }
        let name = match items[1].as_symbol() {
            Some(name) => name.to_string(),
            None => {
                return Step::Fail(ErrorKind::type_message("defmacro", "name must be a symbol"))
            }
        };
        if items[2].as_list().is_none() {
            return Step::Fail(ErrorKind::type_message(
                "defmacro",
                "parameters must be a list",
            ));
        }
        let closure = Closure {
            name: Some(name.clone()),
            params: items[2].clone(),
            body: Form::body_of(items[3..].to_vec()),
            env: self.env.clone(),
        };
        let value = Value::Macro(Rc::new(closure));
        self.env.define_root(name, value.clone());
        Step::Done(value)
    }

    fn enter_match(&mut self, items: Vec<Form>) -> Step {
        if items.len() < 3 {
            return Step::Fail(ErrorKind::type_message(
                "match",
                "expected a value and at least one clause",
            ));
        }
        let mut clauses = Vec::new();
        for clause in &items[2..] {
            match clause.as_list() {
                Some(pair) if pair.len() == 2 => {
                    clauses.push((pair[0].clone(), pair[1].clone()))
                }
                _ => {
                    return Step::Fail(ErrorKind::type_message(
                        "match",
                        format!("clause must be a (pattern result) pair, got {}", clause),
                    ))
                }
            }
        }
        self.state = State::MatchArms { clauses };
        Step::Suspend(items[1].clone(), self.env.clone())
    }

    fn enter_call(&mut self, mut items: Vec<Form>) -> Step {
        let head = items.remove(0);
        self.state = State::CallHead { args: items };
        Step::Suspend(head, self.env.clone())
    }

    fn begin_seq(&mut self, body: Vec<Form>) -> Step {
        let mut pending = body;
        pending.reverse();
        match pending.pop() {
            Some(first) => {
                if pending.is_empty() {
                    Step::Tail(first, self.env.clone())
                } else {
                    self.state = State::Seq { pending };
                    Step::Suspend(first, self.env.clone())
                }
            }
            None => Step::Done(Value::Nil),
        }
    }

    fn begin_quote(&mut self, templates: Vec<Form>) -> Step {
        let mut pending = Vec::new();
        for template in &templates {
            scan_escapes(template, &mut pending);
        }
        pending.reverse();
        match pending.pop() {
            Some(first) => {
                self.state = State::Quote {
                    templates,
                    pending,
                    results: Vec::new(),
                };
                Step::Suspend(first, self.env.clone())
            }
            None => finish_quote(templates, Vec::new()),
        }
    }

    /// Binds the unevaluated argument forms to the macro parameters and
    /// evaluates the macro body in a child of its captured environment.
    /// With `reenter`, the expansion replaces the call site; without it
    /// (`macroexpand`) the expansion is returned as data.
    fn begin_macro(&mut self, mac: Rc<Closure>, args: Vec<Form>, reenter: bool) -> Step {
        let arg_values = Value::List(args.iter().map(lower).collect());
        let bindings = match destructure::bind(&mac.params, &arg_values) {
            Ok(bindings) => bindings,
            Err(Mismatch) => {
                return Step::Fail(ErrorKind::arity_error(
                    mac.describe(),
                    &mac.params,
                    args.len(),
                ))
            }
        };
        self.context = Some(render_context(
            &format!("{} (macro)", mac.describe()),
            &bindings,
        ));
        let scope = Environment::with_parent(mac.env.clone());
        destructure::install(&scope, bindings);
        self.state = State::ExpandMacro { reenter };
        Step::Suspend(mac.body.clone(), scope)
    }

    fn apply(&mut self, callee: Value, args: Vec<Value>, bridge: &dyn HostBridge) -> Step {
        match callee {
            // these two need frame context and are dispatched here
            Value::Builtin("macroexpand", _) => self.apply_macroexpand(args),
            Value::Builtin("eval", _) => self.apply_eval(args),
            Value::Builtin(_, func) => match func(&args) {
                Ok(value) => Step::Done(value),
                Err(kind) => Step::Fail(kind),
            },
            Value::Fn(closure) => {
                let argc = args.len();
                let arg_list = Value::List(args);
                match destructure::bind(&closure.params, &arg_list) {
                    Ok(bindings) => {
                        self.context = Some(render_context(closure.describe(), &bindings));
                        let scope = Environment::with_parent(closure.env.clone());
                        destructure::install(&scope, bindings);
                        Step::Tail(closure.body.clone(), scope)
                    }
                    Err(Mismatch) => Step::Fail(ErrorKind::arity_error(
                        closure.describe(),
                        &closure.params,
                        argc,
                    )),
                }
            }
            Value::HostCallable(host) => {
                match bridge.call(&host, &args, &HashMap::new()) {
                    Ok(value) => Step::Done(value),
                    Err(kind) => Step::Fail(kind),
                }
            }
            other => Step::Fail(ErrorKind::NotCallable(other.to_string())),
        }
    }

    /// One step of macro expansion, returned as data. Expanding a form
    /// that is not a macro call is the identity.
    fn apply_macroexpand(&mut self, args: Vec<Value>) -> Step {
        if args.len() != 1 {
            return Step::Fail(ErrorKind::arity_error("macroexpand", "(form)", args.len()));
        }
        let form = match reify(&args[0]) {
            Ok(form) => form,
            Err(kind) => return Step::Fail(kind),
        };
        if let Form::List(items) = &form {
            if let Some(head) = items.first().and_then(Form::as_symbol) {
                if let Some(Value::Macro(mac)) = self.env.get(head) {
                    return self.begin_macro(mac, items[1..].to_vec(), false);
                }
            }
        }
        Step::Done(args.into_iter().next().unwrap_or(Value::Nil))
    }

    fn apply_eval(&mut self, args: Vec<Value>) -> Step {
        if args.len() != 1 {
            return Step::Fail(ErrorKind::arity_error("eval", "(form)", args.len()));
        }
        match reify(&args[0]) {
            Ok(form) => Step::Tail(form, self.env.clone()),
            Err(kind) => Step::Fail(kind),
        }
    }
}

/// Collects the forms under `~` escapes, in evaluation order. Escapes
/// inside a nested quote belong to that quote and are not collected.
fn scan_escapes(form: &Form, out: &mut Vec<Form>) {
    match form {
        Form::Unquoted(inner) => out.push((**inner).clone()),
        Form::List(items) => {
            for item in items {
                scan_escapes(item, out);
            }
        }
        _ => {}
    }
}

/// Rebuilds the quoted templates as data, splicing evaluated escape
/// results in at their positions. Recursion here is bounded by syntax
/// nesting depth, not by user recursion.
fn build_quoted(
    template: &Form,
    filled: &mut std::vec::IntoIter<Value>,
) -> Result<Value, ErrorKind> {
    match template {
        Form::Unquoted(_) => filled
            .next()
            .ok_or_else(|| ErrorKind::internal("quote escape results exhausted")),
        Form::List(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| build_quoted(item, filled))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        Form::Quoted(_) => Ok(Value::Form(template.clone())),
        other => Ok(lower(other)),
    }
}

fn finish_quote(templates: Vec<Form>, results: Vec<Value>) -> Step {
    let mut filled = results.into_iter();
    let mut values = Vec::with_capacity(templates.len());
    for template in &templates {
        match build_quoted(template, &mut filled) {
            Ok(value) => values.push(value),
            Err(kind) => return Step::Fail(kind),
        }
    }
    if values.len() == 1 {
        Step::Done(values.remove(0))
    } else {
        Step::Done(Value::List(values))
    }
}

/// Largest `%i` placeholder index in a shorthand-function body. Descends
/// nested lists but not nested `#` forms, which have their own
/// parameter namespace.
fn max_placeholder(form: &Form) -> Option<usize> {
    match form {
        Form::Symbol(name) => name.strip_prefix('%').and_then(|rest| rest.parse().ok()),
        Form::List(items) => {
            if items.first().and_then(Form::as_symbol) == Some("#") {
                return None;
            }
            items.iter().filter_map(max_placeholder).max()
        }
        Form::Quoted(inner) | Form::Unquoted(inner) => max_placeholder(inner),
        _ => None,
    }
}

fn render_context(name: &str, bindings: &Bindings) -> String {
    if bindings.is_empty() {
        return name.to_string();
    }
    let parts: Vec<String> = bindings
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    format!("{} with {}", name, parts.join(" "))
}

/// The engine: a frame stack and a result register.
struct Machine<'a> {
    stack: Vec<Frame>,
    register: Option<Value>,
    bridge: &'a dyn HostBridge,
}

impl<'a> Machine<'a> {
    fn new(form: Form, env: Rc<Environment>, bridge: &'a dyn HostBridge) -> Machine<'a> {
        Machine {
            stack: vec![Frame::new(form, env)],
            register: None,
            bridge,
        }
    }

    fn run(&mut self) -> Result<Value, LispError> {
        while let Some(mut frame) = self.stack.pop() {
            match frame.advance(self.register.take(), self.bridge) {
                Step::Done(value) => {
                    self.register = Some(value);
                }
                Step::Suspend(form, env) => {
                    self.stack.push(frame);
                    self.stack.push(Frame::new(form, env));
                }
                Step::Tail(form, env) => {
                    let mut next = Frame::new(form, env);
                    next.context = frame.context.take();
                    self.stack.push(next);
                }
                Step::Fail(kind) => {
                    self.stack.push(frame);
                    let trace = CallTrace::record(
                        self.stack.iter().map(|f| (&f.form, f.context.as_deref())),
                    );
                    return Err(LispError::new(kind, trace));
                }
            }
        }
        Ok(self.register.take().unwrap_or(Value::Nil))
    }
}
