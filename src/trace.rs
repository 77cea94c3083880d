// ABOUTME: Call-trace recorder for error reporting

use crate::form::Form;
use std::fmt;

/// Nesting depth below which trace lines elide sub-lists to `(...)`.
const ELIDE_DEPTH: usize = 3;

/// The forms that were live on the evaluator stack when a failure
/// unwound it, rendered root-to-leaf. The deepest frame is the one the
/// failure happened in.
#[derive(Debug, Clone, Default)]
pub struct CallTrace {
    lines: Vec<String>,
}

impl CallTrace {
    pub fn empty() -> Self {
        CallTrace { lines: Vec::new() }
    }

    /// Records one line per live frame, root first. `frames` yields the
    /// form under evaluation plus the optional human-readable context a
    /// call frame carries (function name and bound parameters).
    pub fn record<'a, I>(frames: I) -> Self
    where
        I: Iterator<Item = (&'a Form, Option<&'a str>)>,
    {
        let lines = frames
            .map(|(form, context)| match context {
                Some(context) => format!("in {}: {}", context, form.render_elided(ELIDE_DEPTH)),
                None => form.render_elided(ELIDE_DEPTH),
            })
            .collect();
        CallTrace { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for CallTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "call trace (innermost last):")?;
        let last = self.lines.len().saturating_sub(1);
        for (i, line) in self.lines.iter().enumerate() {
            if i == last {
                write!(f, "Exception happened here: {}", line)?;
            } else {
                writeln!(f, "  {}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arg: i64) -> Form {
        Form::List(vec![Form::symbol(name), Form::Int(arg)])
    }

    #[test]
    fn test_trace_marks_deepest_frame() {
        let outer = call("f", 1);
        let inner = call("g", 2);
        let frames = vec![(&outer, None), (&inner, Some("f with x=1"))];
        let trace = CallTrace::record(frames.into_iter());

        let rendered = trace.to_string();
        assert!(rendered.contains("  (f 1)\n"));
        assert!(rendered.contains("Exception happened here: in f with x=1: (g 2)"));
    }

    #[test]
    fn test_empty_trace() {
        assert!(CallTrace::empty().is_empty());
    }
}
