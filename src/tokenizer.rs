//! Lexical analysis: turns the raw source text into a vector of tokens.
//!
//! The tokenizer is a single pass over the input bytes with one cursor and
//! one line counter. It knows nothing about semantics beyond classifying
//! keywords, literals, operators, and delimiters; comments produce no
//! tokens but still advance the line counter so diagnostics stay anchored.

use std::fmt;

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Exit,
  Let,
  If,
  Else,
  Ident,
  Number,
  Equals,
  Plus,
  Minus,
  Star,
  Slash,
  OpenParen,
  CloseParen,
  OpenBrace,
  CloseBrace,
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      TokenKind::Exit => "exit",
      TokenKind::Let => "let",
      TokenKind::If => "if",
      TokenKind::Else => "else",
      TokenKind::Ident => "identifier",
      TokenKind::Number => "number",
      TokenKind::Equals => "=",
      TokenKind::Plus => "+",
      TokenKind::Minus => "-",
      TokenKind::Star => "*",
      TokenKind::Slash => "/",
      TokenKind::OpenParen => "(",
      TokenKind::CloseParen => ")",
      TokenKind::OpenBrace => "{",
      TokenKind::CloseBrace => "}",
    };
    f.write_str(text)
  }
}

/// Thin wrapper for lexical information needed by later stages.
///
/// `value` is the literal source text of the lexeme; digit runs and
/// identifier spellings survive byte-for-byte. `line` is the 0-based line
/// on which the first byte of the lexeme sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub value: String,
  pub line: usize,
}

impl Token {
  /// Convenience constructor to keep the `tokenize` loop readable.
  pub fn new(kind: TokenKind, value: impl Into<String>, line: usize) -> Self {
    Self {
      kind,
      value: value.into(),
      line,
    }
  }
}

/// Lex the input into a flat vector of tokens.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;
  let mut line = 0;

  while i < bytes.len() {
    let c = bytes[i];

    if c.is_ascii_alphabetic() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
      }
      let text = &input[start..i];
      let kind = match text {
        "exit" => TokenKind::Exit,
        "let" => TokenKind::Let,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        _ => TokenKind::Ident,
      };
      tokens.push(Token::new(kind, text, line));
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      tokens.push(Token::new(TokenKind::Number, &input[start..i], line));
      continue;
    }

    if c == b'/' && bytes.get(i + 1) == Some(&b'/') {
      i += 2;
      while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
      }
      continue;
    }

    if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
      i += 2;
      while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
        if bytes[i] == b'\n' {
          line += 1;
        }
        i += 1;
      }
      if i < bytes.len() {
        i += 2;
      }
      // The closing `*/` advances the line counter like a newline, even
      // when it sits on the same line as the comment body.
      line += 1;
      continue;
    }

    let kind = match c {
      b'(' => Some(TokenKind::OpenParen),
      b')' => Some(TokenKind::CloseParen),
      b'{' => Some(TokenKind::OpenBrace),
      b'}' => Some(TokenKind::CloseBrace),
      b'=' => Some(TokenKind::Equals),
      b'+' => Some(TokenKind::Plus),
      b'-' => Some(TokenKind::Minus),
      b'*' => Some(TokenKind::Star),
      b'/' => Some(TokenKind::Slash),
      _ => None,
    };
    if let Some(kind) = kind {
      tokens.push(Token::new(kind, &input[i..i + 1], line));
      i += 1;
      continue;
    }

    if c == b'\n' {
      line += 1;
      i += 1;
      continue;
    }

    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    let ch = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::UnexpectedChar { ch, line });
  }

  Ok(tokens)
}
