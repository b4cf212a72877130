//! # Acid Standard Grammar
//!
//! One consumer per production. A consumer takes the literal tokens it needs
//! with [`Parser::expect`], asks for nested symbols with [`Parser::consume`]
//! (or its typed helpers) and assembles the node. It never rewinds on its
//! own: the dispatcher restores the cursor when a consumer fails.
//!
//! | Node type       | Priority | Production                                  |
//! |-----------------|----------|---------------------------------------------|
//! | Program         | 1        | Stmt* until the input is exhausted          |
//! | Declaration     | 1        | `(` `define` ATOM Expr `)`                  |
//! | TypeDeclaration | 1        | `(` `hastype` ATOM Expr `)`                 |
//! | TopLevelExpr    | 2        | Expr                                        |
//! | Call            | 2        | `(` Expr Expr* `)`                          |
//! | Lambda          | 1        | `(` `lambda` `(` ATOM* `)` Expr `)`         |
//! | Variable        | 1        | ATOM                                        |
//! | literals        | 1        | one literal token                           |

use crate::ast::{Declaration, Expr, Node, NodeType, Program, Stmt};
use crate::errors::ParseError;
use crate::lexer::{Token, TokenKind};
use crate::parser::registry::{ConsumerFn, ConsumerRegistry};
use crate::parser::Parser;

/// The standard grammar, in registration order.
pub const STD_RULES: &[(NodeType, ConsumerFn, u32)] = &[
    (NodeType::Program, consume_program, 1),
    (NodeType::Declaration, consume_declaration, 1),
    (NodeType::TypeDeclaration, consume_type_declaration, 1),
    (NodeType::TopLevelExpr, consume_toplevel_expr, 2),
    (NodeType::Call, consume_call, 2),
    (NodeType::Lambda, consume_lambda, 1),
    (NodeType::Variable, consume_variable, 1),
    (NodeType::IntLiteral, consume_int_literal, 1),
    (NodeType::FloatLiteral, consume_float_literal, 1),
    (NodeType::CharLiteral, consume_char_literal, 1),
    (NodeType::StringLiteral, consume_string_literal, 1),
];

pub fn register_std_rules(registry: &mut ConsumerRegistry) {
    for &(node_type, func, priority) in STD_RULES {
        if let Err(err) = registry.register(node_type, func, priority) {
            tracing::error!(%err, "skipping standard rule");
        }
    }
}

// ---
// Statements
// ---

fn consume_program(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    let mut statements = Vec::new();
    while !parser.is_at_end() {
        statements.push(parser.consume_stmt()?);
    }
    Ok(Program {
        statements,
        path: parser.path().map(str::to_string),
    }
    .into())
}

fn consume_declaration(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    consume_binding(parser, TokenKind::Define)
}

// Type declarations share the shape of a definition and currently produce a
// plain `Declaration`; there is no dedicated node for them.
fn consume_type_declaration(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    consume_binding(parser, TokenKind::HasType)
}

fn consume_binding(parser: &mut Parser<'_>, keyword: TokenKind) -> Result<Node, ParseError> {
    parser.expect(TokenKind::LParen)?;
    parser.expect(keyword)?;
    let name = parser.expect(TokenKind::Atom)?.text;
    let value = parser.consume_expr()?;
    parser.expect(TokenKind::RParen)?;
    Ok(Stmt::Declaration(Declaration { name, value }).into())
}

fn consume_toplevel_expr(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    let expr = parser.consume_expr()?;
    Ok(Stmt::TopLevelExpr(expr).into())
}

// ---
// Expressions
// ---

fn consume_call(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    parser.expect(TokenKind::LParen)?;
    let func = parser.consume_expr()?;

    // Arguments are taken greedily, as long as they parse.
    let mut args = Vec::new();
    loop {
        match parser.consume_expr() {
            Ok(arg) => args.push(arg),
            Err(err) if err.is_fatal() => return Err(err),
            Err(_) => break,
        }
    }

    parser.expect(TokenKind::RParen)?;
    Ok(Expr::Call {
        func: Box::new(func),
        args,
    }
    .into())
}

fn consume_lambda(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    parser.expect(TokenKind::LParen)?;
    parser.expect(TokenKind::Lambda)?;
    parser.expect(TokenKind::LParen)?;

    let mut params = Vec::new();
    while parser.peek_kind()? == TokenKind::Atom {
        params.push(parser.expect(TokenKind::Atom)?.text);
    }

    parser.expect(TokenKind::RParen)?;
    let body = parser.consume_expr()?;
    parser.expect(TokenKind::RParen)?;
    Ok(Expr::Lambda {
        params,
        body: Box::new(body),
    }
    .into())
}

fn consume_variable(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    let atom = parser.expect(TokenKind::Atom)?;
    Ok(Expr::Variable(atom.text).into())
}

fn consume_int_literal(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    let token = parser.expect(TokenKind::IntLiteral)?;
    let value = token
        .text
        .parse::<i64>()
        .map_err(|e| invalid_literal(&token, "integer", e.to_string()))?;
    Ok(Expr::Int(value).into())
}

fn consume_float_literal(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    let token = parser.expect(TokenKind::FloatLiteral)?;
    let value = token
        .text
        .parse::<f64>()
        .map_err(|e| invalid_literal(&token, "float", e.to_string()))?;
    Ok(Expr::Float(value).into())
}

fn consume_char_literal(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    let token = parser.expect(TokenKind::CharLiteral)?;
    Ok(Expr::Char(token.text.trim_matches('\'').to_string()).into())
}

fn consume_string_literal(parser: &mut Parser<'_>) -> Result<Node, ParseError> {
    let token = parser.expect(TokenKind::StringLiteral)?;
    let value = unescape_string(&token.text)
        .map_err(|reason| invalid_literal(&token, "string", reason))?;
    Ok(Expr::String(value).into())
}

// ============================================================================
// LITERAL DECODING
// ============================================================================

/// Strips the surrounding quotes of a string token and decodes its backslash
/// escapes. Unknown escapes are kept verbatim, backslash included.
pub fn unescape_string(text: &str) -> Result<String, String> {
    let inner = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(text);
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('a') => result.push('\x07'),
            Some('b') => result.push('\x08'),
            Some('f') => result.push('\x0c'),
            Some('v') => result.push('\x0b'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('\n') => {}
            Some('x') => result.push(hex_escape(&mut chars, 2)?),
            Some('u') => result.push(hex_escape(&mut chars, 4)?),
            Some('U') => result.push(hex_escape(&mut chars, 8)?),
            Some(first @ '0'..='7') => {
                let mut code = first.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                result.push(char::from_u32(code).ok_or("octal escape out of range")?);
            }
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => return Err("\\ at end of string".to_string()),
        }
    }

    Ok(result)
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
) -> Result<char, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("truncated escape {hex:?}, expected {digits} hex digits"));
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("escape \\{hex} is not a valid character"))
}

fn invalid_literal(token: &Token, literal_type: &'static str, reason: String) -> ParseError {
    ParseError::InvalidLiteral {
        literal_type,
        value: token.text.clone(),
        reason,
        span: token.span.into(),
    }
}
