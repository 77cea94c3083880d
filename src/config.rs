// ABOUTME: Configuration and constants for the interpreter binary

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "stacklisp v1.0";
pub const WELCOME_SUBTITLE: &str = "A Lisp with a stack-safe evaluator, macros, and host interop";
pub const WELCOME_FOOTER: &str = "Type any expression, (quit) to exit.";

/// REPL history file, written to the working directory.
pub const HISTORY_FILE: &str = ".stacklisp_history";

pub const PROMPT: &str = "lisp> ";
