//! Acid error handling
//!
//! A single error enum covers lexing, parsing and the REPL front end. Every
//! variant that points into source text carries a [`SourceSpan`]; the source
//! itself is attached late, when the error is turned into a report, since the
//! parser core never needs it.

use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::ast::NodeType;
use crate::lexer::TokenKind;

#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("Expected {expected}, got {found}")]
    #[diagnostic(code(acid::parse::unexpected_token))]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        #[label("unexpected {found}")]
        span: SourceSpan,
    },

    #[error("Unexpected EOF")]
    #[diagnostic(
        code(acid::parse::unexpected_eof),
        help("the input ended in the middle of a form; check for a missing `)`")
    )]
    UnexpectedEof {
        #[label("input ends here")]
        span: SourceSpan,
    },

    #[error("Invalid {literal_type} literal {value}: {reason}")]
    #[diagnostic(code(acid::parse::invalid_literal))]
    InvalidLiteral {
        literal_type: &'static str,
        value: String,
        reason: String,
        #[label("invalid literal")]
        span: SourceSpan,
    },

    #[error("Invalid character {ch:?}")]
    #[diagnostic(code(acid::lex::invalid_character))]
    InvalidCharacter {
        ch: char,
        #[label("not valid here")]
        span: SourceSpan,
    },

    #[error("Unterminated {what}")]
    #[diagnostic(code(acid::lex::unterminated))]
    Unterminated {
        what: &'static str,
        #[label("starts here")]
        span: SourceSpan,
    },

    #[error("Nesting exceeds the maximum depth of {max_depth}")]
    #[diagnostic(
        code(acid::parse::too_deep),
        help("split the form into smaller definitions")
    )]
    TooDeep {
        max_depth: usize,
        #[label("nested too deeply")]
        span: SourceSpan,
    },

    #[error("No production registered for {node_type}")]
    #[diagnostic(
        code(acid::parse::no_production),
        help("register at least one consumer for this node type or one of its subtypes")
    )]
    NoProduction { node_type: NodeType },

    #[error("Expected a {expected} node, got a {found} node")]
    #[diagnostic(
        code(acid::parse::mismatched_node),
        help("a consumer returned a node outside the node type it was registered for")
    )]
    MismatchedNode {
        expected: NodeType,
        found: &'static str,
    },

    #[error("Failed to parse REPL command.")]
    #[diagnostic(code(acid::repl::parse))]
    Repl {
        line: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Could not read {path}")]
    #[diagnostic(code(acid::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// The source span this error points at, if any.
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::UnexpectedEof { span }
            | Self::InvalidLiteral { span, .. }
            | Self::InvalidCharacter { span, .. }
            | Self::Unterminated { span, .. }
            | Self::TooDeep { span, .. }
            | Self::Repl { span, .. } => Some(*span),
            Self::NoProduction { .. } | Self::MismatchedNode { .. } | Self::Io { .. } => None,
        }
    }

    /// Byte offset of the error location, used to rank competing failures.
    pub fn offset(&self) -> Option<usize> {
        self.span().map(|span| span.offset())
    }

    /// Whether the error must abort the parse instead of letting another
    /// production be tried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TooDeep { .. })
    }

    /// Turns the error into a renderable report carrying its source text.
    pub fn with_source(self, name: impl AsRef<str>, source: impl Into<String>) -> Report {
        Report::new(self).with_source_code(NamedSource::new(name, source.into()))
    }
}

/// Prints an error with full miette diagnostics.
pub fn print_error(report: Report) {
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_token_message() {
        let err = ParseError::UnexpectedToken {
            expected: TokenKind::Atom,
            found: TokenKind::IntLiteral,
            span: (9..10).into(),
        };
        assert_eq!(err.to_string(), "Expected ATOM, got INT_LITERAL");
        assert_eq!(err.offset(), Some(9));
    }

    #[test]
    fn test_only_depth_errors_are_fatal() {
        let deep = ParseError::TooDeep {
            max_depth: 4,
            span: (2..3).into(),
        };
        assert!(deep.is_fatal());
        assert_eq!(deep.offset(), Some(2));
        assert!(!ParseError::UnexpectedEof { span: (0..1).into() }.is_fatal());
    }

    #[test]
    fn test_unspanned_errors_have_no_offset() {
        let err = ParseError::NoProduction {
            node_type: NodeType::Expr,
        };
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn test_report_renders_source_name() {
        let err = ParseError::UnexpectedEof {
            span: (3..4).into(),
        };
        let rendered = format!("{:?}", err.with_source("demo.acid", "(f x"));
        assert!(rendered.contains("Unexpected EOF"));
        assert!(rendered.contains("acid::parse::unexpected_eof"));
    }
}
