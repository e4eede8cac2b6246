//! Shared error utilities used across the compilation pipeline.
//!
//! Every error is fatal at its point of detection: each stage bubbles the
//! first failure up to the binary, which prints the message on stderr and
//! exits non-zero. There is no recovery and no multi-error reporting.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Fatal diagnostics raised by the lexer, parser, and code generator.
///
/// Line numbers are 0-based and refer to the line on which the offending
/// token (or character) begins.
#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("Invalid Syntax: Unexpected character `{ch}` at line {line}."))]
  UnexpectedChar { ch: char, line: usize },

  #[snafu(display("Invalid Syntax: Expected `{expected}` after {context} at line {line}."))]
  ExpectedToken {
    expected: String,
    context: String,
    line: usize,
  },

  #[snafu(display("Invalid Syntax: Unexpected token `{token}` at line {line}."))]
  UnexpectedToken { token: String, line: usize },

  #[snafu(display("Failed to parse {what} at line {line}."))]
  MissingExpr { what: String, line: usize },

  #[snafu(display("Invalid Syntax: Identifier `{name}` does not exist!"))]
  UndefinedIdent { name: String },

  #[snafu(display("Identifier `{name}` already exists!"))]
  Redeclaration { name: String },
}
