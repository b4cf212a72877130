//! REPL line classifier
//!
//! Decides what a single line typed at the prompt is: nothing, a shell escape
//! (`:!cmd`), a meta-command (`:name args...`) or acid code. Code is parsed
//! as an expression first and as a statement second.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Expr, Stmt};
use crate::errors::ParseError;
use crate::lexer::Span;
use crate::parser::{Parser, ParserConfig};

/// Source label given to code typed at the prompt.
pub const STDIN_LABEL: &str = "<stdin>";

static BLANK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*$").expect("blank pattern is valid"));
static OS_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:!(?P<cmd>.*)").expect("shell pattern is valid"));
static COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:(?P<name>\w+)(?P<args>.*)").expect("command pattern is valid"));

/// A classified REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplLine {
    Newline,
    OsCommand(String),
    Command { name: String, args: Vec<String> },
    EvalExpr(Expr),
    EvalStmt(Stmt),
}

pub fn parse_repl_line(line: &str) -> Result<ReplLine, ParseError> {
    parse_repl_line_with(line, ParserConfig::default())
}

pub fn parse_repl_line_with(line: &str, config: ParserConfig) -> Result<ReplLine, ParseError> {
    if BLANK.is_match(line) {
        return Ok(ReplLine::Newline);
    }

    if let Some(caps) = OS_COMMAND.captures(line) {
        return Ok(ReplLine::OsCommand(caps["cmd"].to_string()));
    }

    if let Some(caps) = COMMAND.captures(line) {
        return Ok(ReplLine::Command {
            name: caps["name"].to_string(),
            args: caps["args"].split_whitespace().map(String::from).collect(),
        });
    }

    let mut parser = Parser::new(line, Some(STDIN_LABEL))?.with_config(config);

    // A failed `consume` leaves the cursor untouched, so the statement
    // attempt starts from the same token as the expression attempt.
    match parser.consume_expr() {
        Ok(expr) => return Ok(ReplLine::EvalExpr(expr)),
        Err(err) if err.is_fatal() => return Err(err),
        Err(_) => {}
    }
    match parser.consume_stmt() {
        Ok(stmt) => Ok(ReplLine::EvalStmt(stmt)),
        Err(inner) if inner.is_fatal() => Err(inner),
        Err(inner) => {
            tracing::debug!(error = %inner, "line is neither an expression nor a statement");
            Err(ParseError::Repl {
                line: line.to_string(),
                span: Span::point(0).into(),
            })
        }
    }
}
