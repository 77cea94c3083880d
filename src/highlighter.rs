// ABOUTME: Syntax highlighter for the REPL with color support
// Implements rustyline's Highlighter trait to provide ANSI color codes
// for syntax elements while preserving display width

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use stacklisp::value::Value;
use std::borrow::Cow;
use std::collections::HashSet;

// ANSI color codes (3-bit/4-bit colors for maximum terminal compatibility)
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PARENS: &str = "\x1b[1;34m"; // Bold blue
const COLOR_SPECIAL_FORM: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_BUILTIN: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)
const COLOR_QUOTE: &str = "\x1b[1;33m"; // Bold yellow

fn special_forms() -> HashSet<&'static str> {
    [
        "if", "let", "def", "defn", "fn", "#", "do", "quote", "comment", ".", "$", "pyimport",
        "pyimport_from", "defmacro", "match",
    ]
    .into_iter()
    .collect()
}

fn builtins() -> HashSet<&'static str> {
    [
        "+", "-", "*", "/", "=", "!=", "<", ">", "<=", ">=", "not", "and", "or", "list", "first",
        "rest", "cons", "concat", "len", "range", "print", "str", "int", "float", "macroexpand",
        "eval", "inc", "dec", "empty?", "second", "nth", "last", "reduce", "reverse", "map",
        "filter", "zip", "append", "when", "unless",
    ]
    .into_iter()
    .collect()
}

/// REPL helper providing syntax-aware color highlighting.
pub struct LispHelper;

impl LispHelper {
    pub fn new() -> Self {
        LispHelper
    }

    /// Colors an evaluation result for the `=>` echo line.
    pub fn highlight_output(value: &Value) -> String {
        let text = value.to_string();
        match value {
            Value::Int(_) | Value::Float(_) => format!("{}{}{}", COLOR_NUMBER, text, COLOR_RESET),
            Value::Str(_) => format!("{}{}{}", COLOR_STRING, text, COLOR_RESET),
            Value::Fn(_) | Value::Macro(_) | Value::Builtin(..) => {
                format!("{}{}{}", COLOR_BUILTIN, text, COLOR_RESET)
            }
            _ => text,
        }
    }
}

impl Default for LispHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for LispHelper {}

impl Completer for LispHelper {
    type Candidate = String;
}

impl Hinter for LispHelper {
    type Hint = String;
}

impl Validator for LispHelper {}

impl Highlighter for LispHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let highlighted = highlight_line(line, &special_forms(), &builtins());
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true // re-highlight on character input and cursor movement
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || "+-*/%<>=!?_&$#.".contains(c)
}

/// Tokenize a line and apply syntax highlighting
fn highlight_line(
    line: &str,
    special_forms: &HashSet<&'static str>,
    builtins: &HashSet<&'static str>,
) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            // Comments: everything from ; to end of line
            ';' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() && chars[i] != '\n' {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Strings: preserve exact content but colorize
            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
                result.push_str(COLOR_RESET);
            }

            '(' | ')' => {
                result.push_str(COLOR_PARENS);
                result.push(chars[i]);
                result.push_str(COLOR_RESET);
                i += 1;
            }

            '\'' | '~' => {
                result.push_str(COLOR_QUOTE);
                result.push(chars[i]);
                result.push_str(COLOR_RESET);
                i += 1;
            }

            c if c.is_ascii_digit() => {
                result.push_str(COLOR_NUMBER);
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            c if is_word_char(c) => {
                let start = i;
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if special_forms.contains(word.as_str()) {
                    result.push_str(COLOR_SPECIAL_FORM);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if builtins.contains(word.as_str()) {
                    result.push_str(COLOR_BUILTIN);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&word);
                }
            }

            other => {
                result.push(other);
                i += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_forms_are_colored() {
        let out = highlight_line("(if x 1 2)", &special_forms(), &builtins());
        assert!(out.contains(COLOR_SPECIAL_FORM));
        assert!(out.contains("if"));
    }

    #[test]
    fn test_plain_symbols_stay_plain() {
        let out = highlight_line("someword", &special_forms(), &builtins());
        assert_eq!(out, "someword");
    }

    #[test]
    fn test_strings_and_comments_are_colored() {
        let out = highlight_line("\"hi\" ; note", &special_forms(), &builtins());
        assert!(out.contains(COLOR_STRING));
        assert!(out.contains(COLOR_COMMENT));
    }
}
