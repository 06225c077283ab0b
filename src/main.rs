//! Teeny Tiny toolchain
//!
//! A compiler that emits C and an interpreter that executes the token
//! stream directly, both over the same grammar.

mod backend;
mod frontend;
mod utils;

use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use backend::{CCodeGen, Interpreter};
use frontend::lexer::Lexer;
use utils::Error;

/// Teeny Tiny Compiler
#[derive(Parser, Debug)]
#[command(name = "teeny")]
#[command(version = "0.1.0")]
#[command(about = "Teeny Tiny language - compile to C or interpret directly")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file (.teeny)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file for the generated C
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a source file to C
    Build {
        /// Input source file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a source file in the interpreter
    Run {
        /// Input source file
        input: PathBuf,
    },
    /// Check a source file for errors without writing output
    Check {
        /// Input source file
        input: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Build { input, output }) => build_file(&input, output),
        Some(Commands::Run { input }) => run_file(&input),
        Some(Commands::Check { input }) => check_file(&input),
        None => {
            // Default: compile the input file
            if let Some(input) = cli.input {
                build_file(&input, cli.output)
            } else {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: teeny <FILE> or teeny build <FILE>");
                process::exit(1);
            }
        }
    };

    if let Err(err) = result {
        report(&err);
        process::exit(1);
    }
}

/// Print a fatal error with its source line where one is known
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<Error>().and_then(Error::line) {
        Some(line) => eprintln!("Error at line {line}: {err}"),
        None => eprintln!("Error: {err}"),
    }
}

/// Compile a source file to C
fn build_file(input: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    println!("Teeny Tiny Compiler");
    println!("Compiling: {}", input.display());

    let source = fs::read_to_string(input)
        .with_context(|| format!("could not read {}", input.display()))?;

    let lexer = Lexer::new(&source);
    let code = CCodeGen::new(lexer)?.generate()?;
    println!("Parsing completed.");

    let out_path = output.unwrap_or_else(|| PathBuf::from("out.c"));
    fs::write(&out_path, &code)
        .with_context(|| format!("could not write {}", out_path.display()))?;
    println!("Wrote output to {}", out_path.display());

    Ok(())
}

/// Execute a source file in the interpreter
fn run_file(input: &Path) -> anyhow::Result<()> {
    println!("Teeny Tiny Interpreter");

    let source = fs::read_to_string(input)
        .with_context(|| format!("could not read {}", input.display()))?;

    let tokens = Lexer::new(&source).tokenize()?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    Interpreter::new(tokens, stdin.lock(), stdout.lock()).run()?;

    Ok(())
}

/// Validate a source file by running the generator and discarding its output
fn check_file(input: &Path) -> anyhow::Result<()> {
    println!("Checking: {}", input.display());

    let source = fs::read_to_string(input)
        .with_context(|| format!("could not read {}", input.display()))?;

    let lexer = Lexer::new(&source);
    CCodeGen::new(lexer)?.generate()?;
    println!("No errors found");

    Ok(())
}
