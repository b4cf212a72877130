//! Acid Parser - priority-driven recursive descent with backtracking
//!
//! The parser owns an immutable token buffer and a cursor into it. Grammar
//! productions live in [`rules`] and are looked up through a
//! [`ConsumerRegistry`]: asking for a node type tries every production
//! registered for it (and for its concrete subtypes) in priority order, and
//! the first one that succeeds wins.
//!
//! Backtracking is a cursor save/restore: a production may consume any number
//! of tokens and recurse freely before failing, and none of that is visible to
//! the next candidate or to the caller.

use std::fs;
use std::path::Path;

use tracing::trace;

use crate::ast::{Expr, Node, NodeType, Program, Stmt};
use crate::errors::ParseError;
use crate::lexer::{tokenize, Span, Token, TokenKind};

pub mod registry;
pub mod rules;

pub use registry::{default_registry, ConsumerFn, ConsumerRegistry};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Which failure `consume` reports once every candidate production failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureReport {
    /// The failure of the last candidate tried.
    #[default]
    Last,
    /// The failure located furthest into the source. Ties go to the later
    /// candidate.
    Furthest,
}

impl FailureReport {
    fn select(self, previous: Option<ParseError>, latest: ParseError) -> ParseError {
        match (self, previous) {
            (FailureReport::Furthest, Some(previous)) if previous.offset() > latest.offset() => {
                previous
            }
            _ => latest,
        }
    }
}

/// Nesting allowed by default, counted in nested `consume` calls.
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub failure_report: FailureReport,
    /// Deepest chain of nested `consume` calls before the parse is aborted
    /// with [`ParseError::TooDeep`].
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            failure_report: FailureReport::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// ============================================================================
// PARSER
// ============================================================================

pub struct Parser<'r> {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
    /// Where end-of-input failures point.
    eof: Span,
    path: Option<String>,
    registry: &'r ConsumerRegistry,
    config: ParserConfig,
}

impl Parser<'static> {
    /// Tokenizes `source` and prepares a parser over the default grammar.
    pub fn new(source: &str, path: Option<&str>) -> Result<Self, ParseError> {
        let tokens = tokenize(source)?;
        let eof = tokens
            .last()
            .map(|token| token.span)
            .unwrap_or_else(|| Span::point(source.len()));
        Ok(Self {
            eof,
            ..Self::from_tokens(tokens, path)
        })
    }

    /// Builds a parser over an already tokenized input.
    pub fn from_tokens(tokens: Vec<Token>, path: Option<&str>) -> Self {
        let eof = tokens.last().map(|token| token.span).unwrap_or_default();
        Self {
            tokens,
            cursor: 0,
            depth: 0,
            eof,
            path: path.map(str::to_string),
            registry: default_registry(),
            config: ParserConfig::default(),
        }
    }

    /// Reads and tokenizes a source file, labelling the program with its path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let source = read_source(path)?;
        Self::new(&source, Some(&path.display().to_string()))
    }

    /// Parses `source` as a whole program in one go.
    pub fn parse_str(source: &str, path: Option<&str>) -> Result<Program, ParseError> {
        Self::new(source, path)?.run()
    }
}

impl<'r> Parser<'r> {
    /// Swaps the grammar this parser dispatches on.
    pub fn with_registry<'a>(self, registry: &'a ConsumerRegistry) -> Parser<'a> {
        Parser {
            tokens: self.tokens,
            cursor: self.cursor,
            depth: self.depth,
            eof: self.eof,
            path: self.path,
            registry,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_failure_report(mut self, failure_report: FailureReport) -> Self {
        self.config.failure_report = failure_report;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Parses the whole token buffer as a [`Program`].
    pub fn run(&mut self) -> Result<Program, ParseError> {
        self.consume_program()
    }

    /// Tries every production able to build `node_type`, in priority order.
    ///
    /// On failure the cursor is left exactly where it was before the call.
    /// A fatal failure (see [`ParseError::is_fatal`]) stops the search at once.
    pub fn consume(&mut self, node_type: NodeType) -> Result<Node, ParseError> {
        if self.depth >= self.config.max_depth {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let result = self.dispatch(node_type);
        self.depth -= 1;
        result
    }

    fn dispatch(&mut self, node_type: NodeType) -> Result<Node, ParseError> {
        let registry = self.registry;
        let candidates = registry.candidates(node_type);
        trace!(%node_type, candidates = candidates.len(), cursor = self.cursor, "consume");

        let mut failure = None;
        for consumer in candidates {
            let checkpoint = self.cursor;
            match (consumer.func)(self) {
                Ok(node) => {
                    trace!(%node_type, via = %consumer.node_type, "matched");
                    return Ok(node);
                }
                Err(err) => {
                    trace!(via = %consumer.node_type, error = %err, "rewinding");
                    self.cursor = checkpoint;
                    if err.is_fatal() {
                        return Err(err);
                    }
                    failure = Some(self.config.failure_report.select(failure, err));
                }
            }
        }

        Err(failure.unwrap_or(ParseError::NoProduction { node_type }))
    }

    pub fn consume_expr(&mut self) -> Result<Expr, ParseError> {
        self.consume_as(NodeType::Expr, Node::into_expr)
    }

    pub fn consume_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.consume_as(NodeType::Stmt, Node::into_stmt)
    }

    pub fn consume_program(&mut self) -> Result<Program, ParseError> {
        self.consume_as(NodeType::Program, Node::into_program)
    }

    /// `consume`, then unwrap the node. A node of the wrong kind counts as a
    /// failure and rewinds like one.
    fn consume_as<T>(
        &mut self,
        node_type: NodeType,
        unwrap: fn(Node) -> Result<T, Node>,
    ) -> Result<T, ParseError> {
        let checkpoint = self.cursor;
        let node = self.consume(node_type)?;
        unwrap(node).map_err(|other| {
            self.cursor = checkpoint;
            ParseError::MismatchedNode {
                expected: node_type,
                found: other.kind_name(),
            }
        })
    }

    /// Takes the next token if it is of kind `kind`.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.peek().ok_or_else(|| self.end_of_input())?;
        if token.kind != kind {
            return Err(ParseError::UnexpectedToken {
                expected: kind,
                found: token.kind,
                span: token.span.into(),
            });
        }
        let token = token.clone();
        self.cursor += 1;
        Ok(token)
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Kind of the next token, failing at end of input.
    pub fn peek_kind(&self) -> Result<TokenKind, ParseError> {
        self.peek()
            .map(|token| token.kind)
            .ok_or_else(|| self.end_of_input())
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Tokens not yet consumed.
    pub fn remaining(&self) -> &[Token] {
        &self.tokens[self.cursor.min(self.tokens.len())..]
    }

    /// Index of the next token in the buffer.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn end_of_input(&self) -> ParseError {
        ParseError::UnexpectedEof {
            span: self.eof.into(),
        }
    }

    fn too_deep(&self) -> ParseError {
        let span = self.peek().map_or(self.eof, |token| token.span);
        ParseError::TooDeep {
            max_depth: self.config.max_depth,
            span: span.into(),
        }
    }
}

/// Reads a source file, reporting failures as [`ParseError::Io`].
pub fn read_source(path: &Path) -> Result<String, ParseError> {
    fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_advances_only_on_match() {
        let mut parser = Parser::new("(x", None).unwrap();
        assert!(parser.expect(TokenKind::Atom).is_err());
        assert_eq!(parser.position(), 0);
        assert_eq!(parser.expect(TokenKind::LParen).unwrap().text, "(");
        assert_eq!(parser.position(), 1);
    }

    #[test]
    fn test_expect_at_end_points_at_last_token() {
        let mut parser = Parser::new("(x", None).unwrap();
        parser.cursor = 2;
        let err = parser.expect(TokenKind::RParen).unwrap_err();
        match err {
            ParseError::UnexpectedEof { span } => assert_eq!(span.offset(), 1),
            other => panic!("expected end of input, got {other:?}"),
        }
    }

    #[test]
    fn test_expect_on_empty_source_points_at_file_end() {
        let mut parser = Parser::new("   ", None).unwrap();
        let err = parser.expect(TokenKind::LParen).unwrap_err();
        assert_eq!(err.offset(), Some(3));
    }

    #[test]
    fn test_failed_consume_restores_cursor() {
        let mut parser = Parser::new("(define 5 x)", None).unwrap();
        assert!(parser.consume(NodeType::Stmt).is_err());
        assert_eq!(parser.position(), 0);
        assert_eq!(parser.remaining().len(), 5);
    }

    #[test]
    fn test_consume_without_productions() {
        let registry = ConsumerRegistry::new();
        let mut parser = Parser::new("x", None).unwrap().with_registry(&registry);
        let err = parser.consume(NodeType::Expr).unwrap_err();
        assert!(matches!(
            err,
            ParseError::NoProduction {
                node_type: NodeType::Expr
            }
        ));
    }

    #[test]
    fn test_last_failure_is_reported_by_default() {
        // Declaration fails at `5`; the generic call fails earlier, at
        // `define`, and is tried last.
        let err = Parser::parse_str("(define 5 x)", None).unwrap_err();
        match err {
            ParseError::UnexpectedToken {
                expected, found, ..
            } => {
                assert_eq!(expected, TokenKind::LParen);
                assert_eq!(found, TokenKind::Define);
            }
            other => panic!("expected unexpected token, got {other:?}"),
        }
    }

    #[test]
    fn test_furthest_failure_report() {
        let err = Parser::new("(define 5 x)", None)
            .unwrap()
            .with_failure_report(FailureReport::Furthest)
            .run()
            .unwrap_err();
        match err {
            ParseError::UnexpectedToken {
                expected,
                found,
                span,
            } => {
                assert_eq!(expected, TokenKind::Atom);
                assert_eq!(found, TokenKind::IntLiteral);
                assert_eq!(span.offset(), 8);
            }
            other => panic!("expected unexpected token, got {other:?}"),
        }
    }

    #[test]
    fn test_from_file_labels_the_program() {
        let path = std::env::temp_dir().join(format!("acid-parser-{}.acid", std::process::id()));
        fs::write(&path, "(define x 1)\n(f x)\n").unwrap();

        let program = Parser::from_file(&path).unwrap().run().unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(program.statements.len(), 2);
        assert_eq!(program.path, Some(path.display().to_string()));
    }

    #[test]
    fn test_from_file_reports_unreadable_paths() {
        let err = Parser::from_file("no/such/dir/missing.acid").err().unwrap();
        match err {
            ParseError::Io { path, .. } => assert!(path.ends_with("missing.acid")),
            other => panic!("expected an io error, got {other:?}"),
        }
    }

    #[test]
    fn test_depth_is_released_after_each_form() {
        // Program, Stmt, Expr, then one level per list: 5 for `((f))`.
        let source = "((f)) ((g)) ((h))";
        assert!(Parser::new(source, None)
            .unwrap()
            .with_max_depth(5)
            .run()
            .is_ok());

        let err = Parser::new(source, None)
            .unwrap()
            .with_max_depth(4)
            .run()
            .unwrap_err();
        assert!(matches!(err, ParseError::TooDeep { max_depth: 4, .. }), "{err:?}");
    }
}
