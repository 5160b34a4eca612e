//! ecmawalk CLI
//!
//! A command-line interface for the ecmawalk ECMAScript 5 runtime.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ecmawalk::repl::{format_result, Repl};
use ecmawalk::{Error, Runtime, RuntimeConfig, SourceLocation, Value};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecmawalk")]
#[command(author, version, about = "A tree-walking ECMAScript 5 runtime written in Rust", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script file to execute
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Evaluate a string of ECMAScript
    #[arg(short, long, value_name = "CODE")]
    eval: Option<String>,

    /// Print the result (or error) as JSON
    #[arg(long)]
    json: bool,

    /// Evaluate top-level code as strict mode code
    #[arg(long)]
    strict: bool,

    /// Abort after this many statements
    #[arg(long, value_name = "STEPS")]
    max_steps: Option<u64>,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a REPL (Read-Eval-Print-Loop)
    Repl,

    /// Parse and display the syntax tree
    Ast {
        /// The file or code to parse
        input: String,
    },
}

/// `--json` output shape
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Report {
    Ok {
        value: serde_json::Value,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<SourceLocation>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = RuntimeConfig {
        strict: cli.strict,
        operation_limit: cli.max_steps,
        ..Default::default()
    };

    match cli.command {
        Some(Commands::Repl) => return run_repl(config),
        Some(Commands::Ast { input }) => return show_ast(&input),
        None => {}
    }

    if let Some(code) = cli.eval {
        let mut runtime = Runtime::with_config(config);
        let result = runtime.eval(&code);
        return report(&mut runtime, result, cli.json, true);
    }

    if let Some(file) = cli.file {
        return run_file(&file, config, cli.json);
    }

    run_repl(config)
}

fn run_repl(config: RuntimeConfig) -> Result<ExitCode> {
    let mut repl = Repl::new(config).context("failed to start REPL")?;
    repl.run().context("REPL error")?;
    Ok(ExitCode::SUCCESS)
}

fn run_file(path: &Path, config: RuntimeConfig, json: bool) -> Result<ExitCode> {
    let source = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let mut runtime = Runtime::with_config(config);
    let result = runtime.eval(&source);
    report(&mut runtime, result, json, false)
}

fn show_ast(input: &str) -> Result<ExitCode> {
    let source = if Path::new(input).exists() {
        std::fs::read_to_string(input).with_context(|| format!("cannot read {}", input))?
    } else {
        input.to_string()
    };
    match ecmawalk::parser::parse(&source) {
        Ok(program) => {
            println!("{:#?}", program);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print the outcome of an evaluation; files only echo a result with `--json`
fn report(runtime: &mut Runtime, result: ecmawalk::Result<Value>, json: bool, echo: bool) -> Result<ExitCode> {
    match result {
        Ok(value) => {
            if json {
                let value = runtime.to_json_value(&value).unwrap_or(serde_json::Value::Null);
                println!("{}", serde_json::to_string_pretty(&Report::Ok { value })?);
            } else if echo && !value.is_undefined() {
                println!("{}", format_result(&value));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            if json {
                let location = match &err {
                    Error::ParseError { location, .. } => Some(*location),
                    _ => None,
                };
                let report = Report::Error {
                    message: err.to_string(),
                    location,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                eprintln!("{}", err);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
