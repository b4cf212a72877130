//! The Acid Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::path::{Path, PathBuf};
use std::{io, process};

use clap::Parser as _;
use miette::{miette, IntoDiagnostic, Report};
use tracing_subscriber::EnvFilter;

use crate::cli::args::{AcidArgs, Command};
use crate::errors::print_error;
use crate::lexer::tokenize;
use crate::parser::{self, Parser, ParserConfig};
use crate::repl;

pub mod args;
pub mod output;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "ACID_LOG";

/// The main entry point for the CLI.
pub fn run() {
    let args = AcidArgs::parse();
    init_logging(args.verbose);
    let config = args.parser_config();

    // Dispatch to the appropriate subcommand handler.
    let result = match &args.command {
        Command::Ast { file, json } => handle_ast(file, *json, config),
        Command::Tokens { file } => handle_tokens(file),
        Command::Check { files } => handle_check(files, config),
        Command::Repl => repl::run_repl(config).into_diagnostic(),
    };

    if let Err(report) = result {
        print_error(report);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

/// Handles the `ast` subcommand.
fn handle_ast(path: &Path, json: bool, config: ParserConfig) -> Result<(), Report> {
    let (label, source) = read_source(path)?;
    let program = parse_source(&label, &source, config)?;
    if json {
        let rendered = serde_json::to_string_pretty(&program).into_diagnostic()?;
        println!("{rendered}");
    } else {
        output::print_program(&program);
    }
    Ok(())
}

/// Handles the `tokens` subcommand.
fn handle_tokens(path: &Path) -> Result<(), Report> {
    let (label, source) = read_source(path)?;
    let tokens = tokenize(&source).map_err(|e| e.with_source(&label, source.clone()))?;
    output::print_tokens(&tokens, &source);
    Ok(())
}

/// Handles the `check` subcommand. Every file is checked even after a
/// failure; the command fails if any file did.
fn handle_check(paths: &[PathBuf], config: ParserConfig) -> Result<(), Report> {
    let mut failed = 0;
    for path in paths {
        let outcome =
            read_source(path).and_then(|(label, source)| parse_source(&label, &source, config));
        match outcome {
            Ok(program) => output::print_check_ok(path, program.statements.len()),
            Err(report) => {
                failed += 1;
                print_error(report);
            }
        }
    }

    if failed > 0 {
        return Err(miette!("{failed} of {} file(s) failed to parse", paths.len()));
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<(String, String), Report> {
    let label = path.display().to_string();
    let source = parser::read_source(path)?;
    tracing::debug!(file = %label, bytes = source.len(), "read source");
    Ok((label, source))
}

fn parse_source(
    label: &str,
    source: &str,
    config: ParserConfig,
) -> Result<crate::ast::Program, Report> {
    Parser::new(source, Some(label))
        .and_then(|parser| parser.with_config(config).run())
        .map_err(|e| e.with_source(label, source.to_string()))
}
