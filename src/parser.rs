//! Recursive-descent parser producing a statement list and expression AST.
//!
//! Statements use plain descent with one function per statement kind.
//! Binary expressions use precedence climbing: a single loop that folds
//! operands left-associatively, recursing with a raised minimum precedence
//! for the right-hand side. The parser is fail-fast; the first structural
//! error aborts compilation with a line-tagged message.

use crate::ast::{Ast, BinOp, Expr, ExprId, Program, Stmt, StmtId, Term, TermId};
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind};

/// Parse the token stream into a program and the arena holding its nodes.
pub fn parse(tokens: Vec<Token>) -> CompileResult<(Ast, Program)> {
  let mut stream = TokenStream::new(tokens);
  let mut ast = Ast::new();
  let mut stmts = Vec::new();

  while !stream.is_eof() {
    stmts.push(parse_stmt(&mut stream, &mut ast)?);
  }

  Ok((ast, Program { stmts }))
}

// ----- Statement parsing -----
fn parse_stmt(stream: &mut TokenStream, ast: &mut Ast) -> CompileResult<StmtId> {
  match stream.peek_kind() {
    Some(TokenKind::Exit) => parse_exit_stmt(stream, ast),
    Some(TokenKind::Let) => parse_let_stmt(stream, ast),
    Some(TokenKind::Ident) => parse_assign_stmt(stream, ast),
    Some(TokenKind::If) => parse_if_stmt(stream, ast),
    Some(TokenKind::Else) => parse_else_stmt(stream, ast),
    Some(TokenKind::OpenBrace) => parse_scope(stream, ast, "the statement"),
    Some(_) => Err(stream.unexpected_token()),
    None => Err(stream.missing_expr("a statement")),
  }
}

fn parse_exit_stmt(stream: &mut TokenStream, ast: &mut Ast) -> CompileResult<StmtId> {
  stream.skip(TokenKind::Exit, "the statement")?;
  stream.skip(TokenKind::OpenParen, "`exit`")?;
  let value = parse_expr(stream, ast, 0)?.ok_or_else(|| stream.missing_expr("the exit expression"))?;
  stream.skip(TokenKind::CloseParen, "the exit expression")?;
  Ok(ast.alloc_stmt(Stmt::Exit(value)))
}

fn parse_let_stmt(stream: &mut TokenStream, ast: &mut Ast) -> CompileResult<StmtId> {
  stream.skip(TokenKind::Let, "the statement")?;
  let name = stream.get_ident("`let`")?;
  stream.skip(TokenKind::Equals, "the identifier")?;
  let value = parse_expr(stream, ast, 0)?.ok_or_else(|| stream.missing_expr("the let expression"))?;
  Ok(ast.alloc_stmt(Stmt::Let { name, value }))
}

fn parse_assign_stmt(stream: &mut TokenStream, ast: &mut Ast) -> CompileResult<StmtId> {
  let name = stream.get_ident("the statement")?;
  stream.skip(TokenKind::Equals, "the identifier")?;
  let value =
    parse_expr(stream, ast, 0)?.ok_or_else(|| stream.missing_expr("the assignment expression"))?;
  Ok(ast.alloc_stmt(Stmt::Assign { name, value }))
}

fn parse_if_stmt(stream: &mut TokenStream, ast: &mut Ast) -> CompileResult<StmtId> {
  stream.skip(TokenKind::If, "the statement")?;
  stream.skip(TokenKind::OpenParen, "`if`")?;
  let cond = parse_expr(stream, ast, 0)?.ok_or_else(|| stream.missing_expr("the if condition"))?;
  stream.skip(TokenKind::CloseParen, "the if condition")?;
  let body = parse_scope(stream, ast, "the if condition")?;
  Ok(ast.alloc_stmt(Stmt::If { cond, body }))
}

// `else` is a standalone statement; it is not attached to any preceding
// `if` and carries no condition of its own.
fn parse_else_stmt(stream: &mut TokenStream, ast: &mut Ast) -> CompileResult<StmtId> {
  stream.skip(TokenKind::Else, "the statement")?;
  let body = parse_scope(stream, ast, "`else`")?;
  Ok(ast.alloc_stmt(Stmt::Else { body }))
}

fn parse_scope(stream: &mut TokenStream, ast: &mut Ast, context: &str) -> CompileResult<StmtId> {
  stream.skip(TokenKind::OpenBrace, context)?;
  let mut stmts = Vec::new();

  loop {
    if stream.equal(TokenKind::CloseBrace) {
      break;
    }
    if stream.is_eof() {
      return Err(CompileError::ExpectedToken {
        expected: "}".to_string(),
        context: "the scope statements".to_string(),
        line: stream.current_line(),
      });
    }
    stmts.push(parse_stmt(stream, ast)?);
  }

  Ok(ast.alloc_stmt(Stmt::Scope(stmts)))
}

// ----- Expression parsing -----

/// Precedence table for the climbing loop. Higher binds tighter; tokens
/// that are not binary operators carry no precedence and stop the loop.
fn binary_op(kind: TokenKind) -> Option<(BinOp, u8)> {
  match kind {
    TokenKind::Plus => Some((BinOp::Add, 0)),
    TokenKind::Minus => Some((BinOp::Sub, 0)),
    TokenKind::Star => Some((BinOp::Mul, 1)),
    TokenKind::Slash => Some((BinOp::Div, 1)),
    _ => None,
  }
}

/// Parse an expression whose operators all bind at least as tightly as
/// `min_prec`. Returns `Ok(None)` when no expression starts here, which
/// callers turn into their own context-specific error.
fn parse_expr(
  stream: &mut TokenStream,
  ast: &mut Ast,
  min_prec: u8,
) -> CompileResult<Option<ExprId>> {
  let Some(term) = parse_term(stream, ast)? else {
    return Ok(None);
  };
  let mut lhs = ast.alloc_expr(Expr::Term(term));

  while let Some((op, prec)) = stream.peek_kind().and_then(binary_op) {
    if prec < min_prec {
      break;
    }
    stream.advance();
    // `prec + 1` makes the operator left-associative: an equal-precedence
    // operator on the right ends the recursive call instead of nesting.
    let rhs = parse_expr(stream, ast, prec + 1)?
      .ok_or_else(|| stream.missing_expr("the right operand"))?;
    lhs = ast.alloc_expr(Expr::Binary { op, lhs, rhs });
  }

  Ok(Some(lhs))
}

fn parse_term(stream: &mut TokenStream, ast: &mut Ast) -> CompileResult<Option<TermId>> {
  match stream.peek_kind() {
    Some(TokenKind::Number) => {
      let token = stream.get_number("the expression")?;
      Ok(Some(ast.alloc_term(Term::Number(token))))
    }
    Some(TokenKind::Ident) => {
      let token = stream.get_ident("the expression")?;
      Ok(Some(ast.alloc_term(Term::Ident(token))))
    }
    Some(TokenKind::OpenParen) => {
      stream.advance();
      let inner = parse_expr(stream, ast, 0)?
        .ok_or_else(|| stream.missing_expr("the parenthesised expression"))?;
      stream.skip(TokenKind::CloseParen, "the expression")?;
      Ok(Some(ast.alloc_term(Term::Paren(inner))))
    }
    _ => Ok(None),
  }
}

/// Lightweight cursor over the token vector.
struct TokenStream {
  tokens: Vec<Token>,
  pos: usize,
}

impl TokenStream {
  fn new(tokens: Vec<Token>) -> Self {
    Self { tokens, pos: 0 }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn peek_kind(&self) -> Option<TokenKind> {
    self.peek().map(|token| token.kind)
  }

  fn advance(&mut self) {
    self.pos += 1;
  }

  /// Line of the current token, falling back to the last token when the
  /// stream has run out.
  fn current_line(&self) -> usize {
    self
      .tokens
      .get(self.pos)
      .or_else(|| self.tokens.last())
      .map(|token| token.line)
      .unwrap_or(0)
  }

  /// Consume the current token if it matches the provided kind.
  fn equal(&mut self, kind: TokenKind) -> bool {
    if self.peek_kind() == Some(kind) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, kind: TokenKind, context: &str) -> CompileResult<()> {
    if self.equal(kind) {
      Ok(())
    } else {
      Err(CompileError::ExpectedToken {
        expected: kind.to_string(),
        context: context.to_string(),
        line: self.current_line(),
      })
    }
  }

  /// Consume the current token as an identifier.
  fn get_ident(&mut self, context: &str) -> CompileResult<Token> {
    match self.peek() {
      Some(token) if token.kind == TokenKind::Ident => {
        let token = token.clone();
        self.pos += 1;
        Ok(token)
      }
      _ => Err(CompileError::ExpectedToken {
        expected: "identifier".to_string(),
        context: context.to_string(),
        line: self.current_line(),
      }),
    }
  }

  /// Consume the current token as a numeric literal.
  fn get_number(&mut self, context: &str) -> CompileResult<Token> {
    match self.peek() {
      Some(token) if token.kind == TokenKind::Number => {
        let token = token.clone();
        self.pos += 1;
        Ok(token)
      }
      _ => Err(CompileError::ExpectedToken {
        expected: "number".to_string(),
        context: context.to_string(),
        line: self.current_line(),
      }),
    }
  }

  fn unexpected_token(&self) -> CompileError {
    match self.peek() {
      Some(token) => CompileError::UnexpectedToken {
        token: token.value.clone(),
        line: token.line,
      },
      None => CompileError::UnexpectedToken {
        token: "EOF".to_string(),
        line: self.current_line(),
      },
    }
  }

  fn missing_expr(&self, what: &str) -> CompileError {
    CompileError::MissingExpr {
      what: what.to_string(),
      line: self.current_line(),
    }
  }

  fn is_eof(&self) -> bool {
    self.pos >= self.tokens.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::tokenize;

  fn parse_source(source: &str) -> (Ast, Program) {
    parse(tokenize(source).expect("tokenize failed")).expect("parse failed")
  }

  fn parse_err(source: &str) -> CompileError {
    parse(tokenize(source).expect("tokenize failed")).expect_err("parse should fail")
  }

  /// Strip the `Paren` and `Term` wrappers down to the underlying binary
  /// node, if any.
  fn as_binary(ast: &Ast, id: ExprId) -> Option<(BinOp, ExprId, ExprId)> {
    match ast.expr(id) {
      Expr::Binary { op, lhs, rhs } => Some((*op, *lhs, *rhs)),
      Expr::Term(term) => match ast.term(*term) {
        Term::Paren(inner) => as_binary(ast, *inner),
        _ => None,
      },
    }
  }

  fn number_value(ast: &Ast, id: ExprId) -> String {
    match ast.expr(id) {
      Expr::Term(term) => match ast.term(*term) {
        Term::Number(token) => token.value.clone(),
        other => panic!("expected number, got {other:?}"),
      },
      other => panic!("expected term, got {other:?}"),
    }
  }

  #[test]
  fn exit_statement_shape() {
    let (ast, program) = parse_source("exit(0)");
    assert_eq!(program.stmts.len(), 1);
    match ast.stmt(program.stmts[0]) {
      Stmt::Exit(value) => assert_eq!(number_value(&ast, *value), "0"),
      other => panic!("expected Exit, got {other:?}"),
    }
  }

  #[test]
  fn precedence_puts_mul_on_the_right_of_add() {
    let (ast, program) = parse_source("exit(1 + 2 * 3)");
    let Stmt::Exit(root) = ast.stmt(program.stmts[0]) else {
      panic!("expected Exit");
    };
    let (op, lhs, rhs) = as_binary(&ast, *root).expect("expected binary root");
    assert_eq!(op, BinOp::Add);
    assert_eq!(number_value(&ast, lhs), "1");
    let (op, lhs, rhs) = as_binary(&ast, rhs).expect("expected binary rhs");
    assert_eq!(op, BinOp::Mul);
    assert_eq!(number_value(&ast, lhs), "2");
    assert_eq!(number_value(&ast, rhs), "3");
  }

  #[test]
  fn precedence_keeps_mul_on_the_left_of_add() {
    let (ast, program) = parse_source("exit(1 * 2 + 3)");
    let Stmt::Exit(root) = ast.stmt(program.stmts[0]) else {
      panic!("expected Exit");
    };
    let (op, lhs, rhs) = as_binary(&ast, *root).expect("expected binary root");
    assert_eq!(op, BinOp::Add);
    assert_eq!(number_value(&ast, rhs), "3");
    let (op, ..) = as_binary(&ast, lhs).expect("expected binary lhs");
    assert_eq!(op, BinOp::Mul);
  }

  #[test]
  fn subtraction_is_left_associative() {
    let (ast, program) = parse_source("exit(10 - 3 - 2)");
    let Stmt::Exit(root) = ast.stmt(program.stmts[0]) else {
      panic!("expected Exit");
    };
    let (op, lhs, rhs) = as_binary(&ast, *root).expect("expected binary root");
    assert_eq!(op, BinOp::Sub);
    assert_eq!(number_value(&ast, rhs), "2");
    let (op, lhs, rhs) = as_binary(&ast, lhs).expect("expected binary lhs");
    assert_eq!(op, BinOp::Sub);
    assert_eq!(number_value(&ast, lhs), "10");
    assert_eq!(number_value(&ast, rhs), "3");
  }

  #[test]
  fn parentheses_force_grouping() {
    let (ast, program) = parse_source("exit((1 + 2) * 3)");
    let Stmt::Exit(root) = ast.stmt(program.stmts[0]) else {
      panic!("expected Exit");
    };
    let (op, lhs, rhs) = as_binary(&ast, *root).expect("expected binary root");
    assert_eq!(op, BinOp::Mul);
    assert_eq!(number_value(&ast, rhs), "3");
    let Expr::Term(term) = ast.expr(lhs) else {
      panic!("expected wrapped lhs");
    };
    let Term::Paren(inner) = ast.term(*term) else {
      panic!("expected parenthesised lhs");
    };
    let (op, ..) = as_binary(&ast, *inner).expect("expected binary inside parens");
    assert_eq!(op, BinOp::Add);
  }

  #[test]
  fn let_and_assignment_statements() {
    let (ast, program) = parse_source("let x = 5 x = 6");
    assert_eq!(program.stmts.len(), 2);
    match ast.stmt(program.stmts[0]) {
      Stmt::Let { name, .. } => assert_eq!(name.value, "x"),
      other => panic!("expected Let, got {other:?}"),
    }
    match ast.stmt(program.stmts[1]) {
      Stmt::Assign { name, .. } => assert_eq!(name.value, "x"),
      other => panic!("expected Assign, got {other:?}"),
    }
  }

  #[test]
  fn if_statement_wraps_a_scope() {
    let (ast, program) = parse_source("if (1) { exit(2) }");
    let Stmt::If { body, .. } = ast.stmt(program.stmts[0]) else {
      panic!("expected If");
    };
    match ast.stmt(*body) {
      Stmt::Scope(stmts) => assert_eq!(stmts.len(), 1),
      other => panic!("expected Scope body, got {other:?}"),
    }
  }

  #[test]
  fn else_parses_as_a_standalone_statement() {
    let (ast, program) = parse_source("else { exit(1) }");
    match ast.stmt(program.stmts[0]) {
      Stmt::Else { .. } => {}
      other => panic!("expected Else, got {other:?}"),
    }
  }

  #[test]
  fn bare_scope_statement() {
    let (ast, program) = parse_source("{ let x = 1 }");
    match ast.stmt(program.stmts[0]) {
      Stmt::Scope(stmts) => assert_eq!(stmts.len(), 1),
      other => panic!("expected Scope, got {other:?}"),
    }
  }

  #[test]
  fn missing_close_paren_is_fatal() {
    let err = parse_err("exit(1");
    assert_eq!(
      err.to_string(),
      "Invalid Syntax: Expected `)` after the exit expression at line 0."
    );
  }

  #[test]
  fn missing_identifier_after_let_is_fatal() {
    let err = parse_err("let = 5");
    assert!(err.to_string().contains("Expected `identifier` after `let`"));
  }

  #[test]
  fn missing_close_brace_is_fatal() {
    let err = parse_err("{ let x = 1");
    assert!(err.to_string().contains("Expected `}`"));
  }

  #[test]
  fn unexpected_leading_token_is_fatal() {
    let err = parse_err("+ 5");
    assert_eq!(err.to_string(), "Invalid Syntax: Unexpected token `+` at line 0.");
  }

  #[test]
  fn operator_without_right_operand_is_fatal() {
    let err = parse_err("exit(1 +)");
    assert_eq!(err.to_string(), "Failed to parse the right operand at line 0.");
  }

  #[test]
  fn empty_parentheses_are_fatal() {
    let err = parse_err("exit(())");
    assert!(err.to_string().starts_with("Failed to parse"));
  }

  #[test]
  fn error_lines_follow_the_source() {
    let err = parse_err("let x = 5\nexit(x");
    assert!(err.to_string().contains("at line 1"));
  }
}
