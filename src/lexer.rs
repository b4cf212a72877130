//! Acid lexer
//!
//! Turns source text into a flat, finite list of [`Token`]s. Whitespace and
//! `;` line comments are skipped. The parser never looks at raw text again:
//! every later stage works on the token buffer produced here.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::ParseError;

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// The closed set of token kinds the lexer can produce.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    LParen,
    RParen,
    Define,
    HasType,
    Lambda,
    Atom,
    IntLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,
}

impl TokenKind {
    /// Upper-case name used in diagnostics (`Expected ATOM, got RPAREN`).
    pub const fn name(self) -> &'static str {
        match self {
            Self::LParen => "LPAREN",
            Self::RParen => "RPAREN",
            Self::Define => "DEFINE",
            Self::HasType => "HASTYPE",
            Self::Lambda => "LAMBDA",
            Self::Atom => "ATOM",
            Self::IntLiteral => "INT_LITERAL",
            Self::FloatLiteral => "FLOAT_LITERAL",
            Self::CharLiteral => "CHAR_LITERAL",
            Self::StringLiteral => "STRING_LITERAL",
        }
    }

    fn keyword(word: &str) -> Option<Self> {
        match word {
            "define" => Some(Self::Define),
            "hastype" => Some(Self::HasType),
            "lambda" => Some(Self::Lambda),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A byte range in the source text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty span at `offset`.
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// One-based line and column of the span start.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let before = &source[..self.start.min(source.len())];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, column)
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::from(span.start..span.end)
    }
}

/// One lexical unit. Tokens are produced once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} @{}..{}", self.kind, self.text, self.span.start, self.span.end)
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

static TRIVIA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\s+|;[^\n]*)+").expect("trivia pattern is valid"));
static STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?s)"(?:\\.|[^"\\])*""#).expect("string pattern is valid"));
static CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^'(?:\\.|[^'\\])'").expect("char pattern is valid"));
static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[^\s()"';]+"#).expect("word pattern is valid"));
// Numbers are ASCII only; `\d` would also accept other scripts' digits.
static INT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("int pattern is valid"));
static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:(?:[0-9]+\.[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+)$")
        .expect("float pattern is valid")
});

/// Tokenizes acid source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    while offset < source.len() {
        let rest = &source[offset..];
        if let Some(trivia) = TRIVIA.find(rest) {
            offset += trivia.end();
            continue;
        }

        let (kind, len) = next_token(rest, offset)?;
        let span = Span::new(offset, offset + len);
        tokens.push(Token {
            kind,
            text: rest[..len].to_string(),
            span,
        });
        offset = span.end;
    }

    tracing::trace!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn next_token(rest: &str, offset: usize) -> Result<(TokenKind, usize), ParseError> {
    // `rest` is never empty and never starts with trivia here.
    let first = rest.chars().next().unwrap_or_default();

    match first {
        '(' => Ok((TokenKind::LParen, 1)),
        ')' => Ok((TokenKind::RParen, 1)),
        '"' => STRING
            .find(rest)
            .map(|m| (TokenKind::StringLiteral, m.end()))
            .ok_or_else(|| ParseError::Unterminated {
                what: "string literal",
                span: Span::new(offset, offset + rest.len()).into(),
            }),
        '\'' => CHAR
            .find(rest)
            .map(|m| (TokenKind::CharLiteral, m.end()))
            .ok_or_else(|| invalid_character(first, offset)),
        _ => {
            let word = WORD
                .find(rest)
                .ok_or_else(|| invalid_character(first, offset))?
                .as_str();
            Ok((classify_word(word), word.len()))
        }
    }
}

fn classify_word(word: &str) -> TokenKind {
    if let Some(keyword) = TokenKind::keyword(word) {
        keyword
    } else if INT.is_match(word) {
        TokenKind::IntLiteral
    } else if FLOAT.is_match(word) {
        TokenKind::FloatLiteral
    } else {
        TokenKind::Atom
    }
}

fn invalid_character(ch: char, offset: usize) -> ParseError {
    ParseError::InvalidCharacter {
        ch,
        span: Span::new(offset, offset + ch.len_utf8()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_declaration() {
        use TokenKind::*;
        assert_eq!(
            kinds("(define x 5)"),
            vec![LParen, Define, Atom, IntLiteral, RParen]
        );
    }

    #[test]
    fn test_tokenize_literals() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"-3 2.5 .5 1e3 'a' "hi\"there" + -"#),
            vec![
                IntLiteral,
                FloatLiteral,
                FloatLiteral,
                FloatLiteral,
                CharLiteral,
                StringLiteral,
                Atom,
                Atom
            ]
        );
    }

    #[test]
    fn test_comments_and_whitespace_are_skipped() {
        let tokens = tokenize("; leading comment\n  (f) ; trailing\n").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].text, "f");
        assert_eq!(tokens[1].span, Span::new(21, 22));
    }

    #[test]
    fn test_non_ascii_digits_are_atoms() {
        use TokenKind::*;
        assert_eq!(kinds("١٢ ١.٥ 12"), vec![Atom, Atom, IntLiteral]);
    }

    #[test]
    fn test_keywords_need_whole_words() {
        use TokenKind::*;
        assert_eq!(kinds("definer lambda"), vec![Atom, Lambda]);
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = tokenize(r#"(print "oops)"#).unwrap_err();
        assert!(matches!(err, ParseError::Unterminated { .. }));
    }

    #[test]
    fn test_stray_quote_fails() {
        let err = tokenize("'ab'").unwrap_err();
        assert!(matches!(err, ParseError::InvalidCharacter { ch: '\'', .. }));
    }

    #[test]
    fn test_line_col() {
        let source = "(a\n  b)";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[2].span.line_col(source), (2, 3));
    }
}
