//! Defines the command-line arguments and subcommands for the Acid CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::parser::{FailureReport, ParserConfig};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "acid",
    version,
    about = "Parse acid source files and explore them interactively."
)]
pub struct AcidArgs {
    /// Raise the log level (-v debug, -vv trace). `ACID_LOG` overrides it.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Report the parse failure located furthest into the source instead of
    /// the failure of the last production tried.
    #[arg(long, global = true)]
    pub furthest_error: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl AcidArgs {
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            failure_report: if self.furthest_error {
                FailureReport::Furthest
            } else {
                FailureReport::Last
            },
            ..ParserConfig::default()
        }
    }
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the Abstract Syntax Tree (AST) for a script.
    Ast {
        /// The path to the acid source file to parse.
        #[arg(required = true)]
        file: PathBuf,
        /// Print the tree as JSON instead of acid syntax.
        #[arg(long)]
        json: bool,
    },
    /// Print the token stream of a script.
    Tokens {
        /// The path to the acid source file to tokenize.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Check that one or more scripts parse.
    Check {
        /// The acid source files to check.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Start an interactive session.
    Repl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_furthest_error_flag_selects_policy() {
        let args = AcidArgs::parse_from(["acid", "ast", "main.acid", "--furthest-error"]);
        assert_eq!(args.parser_config().failure_report, FailureReport::Furthest);

        let args = AcidArgs::parse_from(["acid", "-vv", "check", "a.acid", "b.acid"]);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.parser_config(), ParserConfig::default());
        assert!(matches!(args.command, Command::Check { ref files } if files.len() == 2));
    }
}
