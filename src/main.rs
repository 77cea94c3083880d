// ABOUTME: CLI entry point: script execution and the interactive REPL

mod config;
mod highlighter;

use clap::Parser;
use highlighter::LispHelper;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use stacklisp::host::NativeBridge;
use stacklisp::interp::Interpreter;
use std::path::PathBuf;
use std::rc::Rc;

/// Lisp interpreter with a stack-safe evaluator and host interop
#[derive(Parser, Debug)]
#[command(name = "stacklisp")]
#[command(version = config::VERSION)]
#[command(about = "A Lisp with a stack-safe evaluator, macros, and host interop")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Skip loading the bootstrap standard library
    #[arg(long = "no-stdlib")]
    no_stdlib: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let interp = if args.no_stdlib {
        Interpreter::bare(Rc::new(NativeBridge::new()))
    } else {
        match Interpreter::new() {
            Ok(interp) => interp,
            Err(e) => {
                eprintln!("Error: failed to load stdlib: {}", e);
                std::process::exit(1);
            }
        }
    };

    if let Some(script_path) = args.script {
        run_script(&script_path, &interp);
        return Ok(());
    }

    repl(&interp)
}

/// Execute a script file; any failure prints its call trace and exits
/// with a non-zero status.
fn run_script(path: &PathBuf, interp: &Interpreter) {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Error: cannot read script file {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = interp.eval_str(&contents) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// The interactive loop. Failures print and the session continues.
fn repl(interp: &Interpreter) -> Result<(), Box<dyn std::error::Error>> {
    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<LispHelper, DefaultHistory> =
        Editor::with_config(rl_config).map_err(|e| format!("failed to initialize REPL: {}", e))?;
    rl.set_helper(Some(LispHelper::new()));

    let _ = rl.load_history(config::HISTORY_FILE);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);
    println!("{}", config::WELCOME_FOOTER);

    loop {
        match rl.readline(config::PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                match line.trim() {
                    "(quit)" | "(exit)" => {
                        println!("Goodbye!");
                        break;
                    }
                    "(clear)" => {
                        print!("\x1B[2J\x1B[H"); // ANSI clear screen
                        continue;
                    }
                    _ => {}
                }

                match interp.eval_str(&line) {
                    Ok(result) => {
                        println!("=> {}", LispHelper::highlight_output(&result));
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(config::HISTORY_FILE);

    Ok(())
}
