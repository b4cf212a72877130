//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for pretty-printing and colorizing output. By
//! centralizing output logic here, we ensure a consistent user experience
//! across all commands.

use std::io;
use std::path::Path;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::ast::Program;
use crate::lexer::{Token, TokenKind};

// ============================================================================
// CORE OUTPUT FUNCTIONS: User-facing CLI output utilities
// ============================================================================

/// Prints every statement of a program on its own line, in acid syntax.
pub fn print_program(program: &Program) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = write_program(&mut stdout, program);
}

/// Prints a token listing: position, kind and text.
pub fn print_tokens(tokens: &[Token], source: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = write_tokens(&mut stdout, tokens, source);
}

/// Reports a file that parsed cleanly.
pub fn print_check_ok(path: &Path, statements: usize) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    print!("ok");
    let _ = stdout.reset();
    println!(" {} ({statements} statements)", path.display());
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn write_program(out: &mut dyn WriteColor, program: &Program) -> io::Result<()> {
    for stmt in &program.statements {
        writeln!(out, "{stmt}")?;
    }
    out.flush()
}

fn write_tokens(out: &mut dyn WriteColor, tokens: &[Token], source: &str) -> io::Result<()> {
    for token in tokens {
        let (line, column) = token.span.line_col(source);
        write!(out, "{line:>4}:{column:<4} ")?;
        out.set_color(ColorSpec::new().set_fg(Some(kind_color(token.kind))))?;
        write!(out, "{:<15}", token.kind.name())?;
        out.reset()?;
        writeln!(out, "{}", token.text)?;
    }
    out.flush()
}

fn kind_color(kind: TokenKind) -> Color {
    match kind {
        TokenKind::LParen | TokenKind::RParen => Color::White,
        TokenKind::Define | TokenKind::HasType | TokenKind::Lambda => Color::Magenta,
        TokenKind::Atom => Color::Cyan,
        TokenKind::IntLiteral
        | TokenKind::FloatLiteral
        | TokenKind::CharLiteral
        | TokenKind::StringLiteral => Color::Yellow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::Parser;
    use termcolor::Buffer;

    #[test]
    fn test_token_listing() {
        let source = "(f\n  \"s\")";
        let tokens = tokenize(source).unwrap();
        let mut buffer = Buffer::no_color();
        write_tokens(&mut buffer, &tokens, source).unwrap();
        let text = String::from_utf8(buffer.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "   2:3    STRING_LITERAL \"s\"");
    }

    #[test]
    fn test_program_listing() {
        let program = Parser::parse_str("(define x 1) (f x)", None).unwrap();
        let mut buffer = Buffer::no_color();
        write_program(&mut buffer, &program).unwrap();
        assert_eq!(
            String::from_utf8(buffer.into_inner()).unwrap(),
            "(define x 1)\n(f x)\n"
        );
    }
}
