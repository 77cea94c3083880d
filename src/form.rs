// ABOUTME: Form types representing parsed source expressions

use std::fmt;

/// A parsed source expression. Forms are immutable once built by the
/// parser; quoting carries them into runtime values unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    Symbol(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    List(Vec<Form>),
    Quoted(Box<Form>),
    Unquoted(Box<Form>),
}

impl Form {
    pub fn symbol(name: &str) -> Form {
        Form::Symbol(name.to_string())
    }

    /// Symbol name, if this form is a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Form::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// List elements, if this form is a list.
    pub fn as_list(&self) -> Option<&[Form]> {
        match self {
            Form::List(items) => Some(items),
            _ => None,
        }
    }

    /// Wraps a function/macro body in `(do ...)` unless it is a single form.
    pub fn body_of(mut forms: Vec<Form>) -> Form {
        if forms.len() == 1 {
            forms.remove(0)
        } else {
            let mut items = vec![Form::symbol("do")];
            items.append(&mut forms);
            Form::List(items)
        }
    }

    /// Renders the form with nested lists below `depth` elided to `(...)`.
    /// Used by the call-trace recorder to keep trace lines readable.
    pub fn render_elided(&self, depth: usize) -> String {
        match self {
            Form::List(items) => {
                if depth == 0 {
                    "(...)".to_string()
                } else {
                    let inner: Vec<String> = items
                        .iter()
                        .map(|item| item.render_elided(depth - 1))
                        .collect();
                    format!("({})", inner.join(" "))
                }
            }
            Form::Quoted(inner) => format!("'{}", inner.render_elided(depth)),
            Form::Unquoted(inner) => format!("~{}", inner.render_elided(depth)),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::Symbol(name) => write!(f, "{}", name),
            Form::Int(n) => write!(f, "{}", n),
            Form::Float(n) => write!(f, "{}", n),
            Form::Str(s) => write!(f, "\"{}\"", s),
            Form::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Form::Nil => write!(f, "None"),
            Form::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Form::Quoted(inner) => write!(f, "'{}", inner),
            Form::Unquoted(inner) => write!(f, "~{}", inner),
        }
    }
}
