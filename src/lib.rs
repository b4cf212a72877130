//! Acid: an extensible backtracking parser for a small Lisp-like language.
//!
//! Source text is tokenized by [`lexer`], then [`parser::Parser`] builds an
//! [`ast::Program`] by dispatching on node types through a registry of
//! prioritized grammar productions. [`repl`] routes interactive lines either
//! to the parser or to meta-commands.

pub use crate::errors::ParseError;
pub use crate::parser::Parser;

pub mod ast;
pub mod cli;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod repl;
