//! Acid REPL (Read-Parse-Print Loop)
//!
//! Provides an interactive shell that classifies each entry, runs
//! meta-commands, and prints the tree parsed from code entries.

use std::io::{self, BufRead, Write};
use std::process;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::errors::ParseError;
use crate::lexer::tokenize;
use crate::parser::ParserConfig;

pub mod syntax;

pub use syntax::{parse_repl_line, parse_repl_line_with, ReplLine};

/// REPL command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Continue,
    Quit,
}

/// REPL state that persists across entries
pub struct ReplState {
    config: ParserConfig,
    line_number: usize,
}

impl Default for ReplState {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl ReplState {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            line_number: 1,
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Classifies one entry and acts on it, writing everything to `out`.
    pub fn handle_line(&mut self, input: &str, out: &mut dyn WriteColor) -> io::Result<ReplCommand> {
        let classified = parse_repl_line_with(input, self.config);
        self.line_number += 1;

        match classified {
            Ok(ReplLine::Newline) => Ok(ReplCommand::Continue),
            Ok(ReplLine::OsCommand(cmd)) => {
                run_shell(&cmd, out)?;
                Ok(ReplCommand::Continue)
            }
            Ok(ReplLine::Command { name, args }) => handle_repl_command(&name, &args, out),
            Ok(ReplLine::EvalExpr(expr)) => {
                print_tagged(out, "expr", Color::Green, &expr.to_string())?;
                Ok(ReplCommand::Continue)
            }
            Ok(ReplLine::EvalStmt(stmt)) => {
                print_tagged(out, "stmt", Color::Cyan, &stmt.to_string())?;
                Ok(ReplCommand::Continue)
            }
            Err(err) => {
                print_parse_error(out, err, input)?;
                Ok(ReplCommand::Continue)
            }
        }
    }
}

/// Main REPL entry point
pub fn run_repl(config: ParserConfig) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    writeln!(stdout, "Acid REPL v{}", env!("CARGO_PKG_VERSION"))?;
    writeln!(stdout, "Type :help for help, :quit to exit")?;
    writeln!(stdout)?;

    let mut state = ReplState::new(config);
    let mut input_buffer = String::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if input_buffer.is_empty() {
            write!(stdout, "acid> ")?;
        } else {
            write!(stdout, "   -> ")?;
        }
        stdout.flush()?;

        let Some(line) = lines.next() else {
            // EOF (Ctrl+D)
            writeln!(stdout, "\nGoodbye!")?;
            break;
        };
        let line = line?;

        // Meta-commands are only recognised at the start of an entry.
        if input_buffer.is_empty() && line.trim_start().starts_with(':') {
            if state.handle_line(line.trim(), &mut stdout)? == ReplCommand::Quit {
                break;
            }
            continue;
        }

        if !input_buffer.is_empty() {
            input_buffer.push('\n');
        }
        input_buffer.push_str(&line);

        // An empty line flushes an incomplete entry so its error is shown.
        if is_complete_expression(&input_buffer) || line.trim().is_empty() {
            tracing::debug!(line = state.line_number(), "submitting entry");
            state.handle_line(&input_buffer, &mut stdout)?;
            input_buffer.clear();
        }
    }

    Ok(())
}

/// Handle meta-commands that start with ':'
fn handle_repl_command(
    name: &str,
    args: &[String],
    out: &mut dyn WriteColor,
) -> io::Result<ReplCommand> {
    match name.to_ascii_lowercase().as_str() {
        "help" | "h" => {
            writeln!(out, "Acid REPL Commands:")?;
            writeln!(out, "  :help, :h          Show this help")?;
            writeln!(out, "  :quit, :q          Exit the REPL")?;
            writeln!(out, "  :tokens, :t CODE   Show the tokens of CODE")?;
            writeln!(out, "  :!CMD              Run CMD in the system shell")?;
            writeln!(out)?;
            writeln!(out, "Enter acid expressions or statements to see how they parse.")?;
            writeln!(out, "Multi-line entries are supported.")?;
            Ok(ReplCommand::Continue)
        }
        "quit" | "q" => {
            writeln!(out, "Goodbye!")?;
            Ok(ReplCommand::Quit)
        }
        "tokens" | "t" => {
            let code = args.join(" ");
            match tokenize(&code) {
                Ok(tokens) => {
                    for token in tokens {
                        writeln!(out, "{token}")?;
                    }
                }
                Err(err) => print_parse_error(out, err, &code)?,
            }
            Ok(ReplCommand::Continue)
        }
        _ => {
            writeln!(
                out,
                "Unknown command: :{}. Type :help for available commands.",
                name
            )?;
            Ok(ReplCommand::Continue)
        }
    }
}

fn run_shell(cmd: &str, out: &mut dyn WriteColor) -> io::Result<()> {
    let (shell, flag) = if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };
    tracing::debug!(%cmd, "running shell command");
    match process::Command::new(shell).arg(flag).arg(cmd).output() {
        Ok(output) => {
            out.write_all(&output.stdout)?;
            out.write_all(&output.stderr)?;
            if !output.status.success() {
                print_tagged(out, "shell", Color::Yellow, &output.status.to_string())?;
            }
        }
        Err(err) => print_tagged(out, "shell", Color::Red, &err.to_string())?,
    }
    Ok(())
}

fn print_tagged(out: &mut dyn WriteColor, tag: &str, color: Color, text: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{tag}")?;
    out.reset()?;
    writeln!(out, " {text}")
}

fn print_parse_error(out: &mut dyn WriteColor, err: ParseError, input: &str) -> io::Result<()> {
    match err {
        // The REPL-level failure carries no useful location.
        ParseError::Repl { .. } => print_tagged(out, "error", Color::Red, &err.to_string()),
        other => writeln!(
            out,
            "{:?}",
            other.with_source(syntax::STDIN_LABEL, input.to_string())
        ),
    }
}

/// Simple heuristic to check if an entry is complete: parentheses balance
/// outside of string/char literals and comments.
fn is_complete_expression(input: &str) -> bool {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return false;
    }

    let mut paren_count = 0;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escape_next = false;
    let mut chars = trimmed.chars().peekable();

    while let Some(ch) = chars.next() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if in_comment {
            in_comment = ch != '\n';
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            // Char literal: one character or one escape, then the closing quote.
            '\'' if !in_string => {
                if chars.next() == Some('\\') {
                    chars.next();
                }
                chars.next_if_eq(&'\'');
            }
            ';' if !in_string => in_comment = true,
            '(' if !in_string => paren_count += 1,
            ')' if !in_string => paren_count -= 1,
            _ => {}
        }
    }

    paren_count <= 0 && !in_string
}
