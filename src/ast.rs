//! Abstract syntax tree and its backing storage.
//!
//! Nodes live in `id_arena` arenas and refer to each other through stable
//! ids, so the mutually recursive shapes (expressions containing terms
//! containing expressions) need no boxing. The whole `Ast` is handed to
//! the code generator by move and dropped in one step afterwards; no node
//! is freed individually.

use id_arena::{Arena, Id};

use crate::tokenizer::Token;

pub type TermId = Id<Term>;
pub type ExprId = Id<Expr>;
pub type StmtId = Id<Stmt>;

/// An atomic operand. Embedded tokens are only ever numbers or
/// identifiers; operator and delimiter tokens are consumed by the parser.
#[derive(Debug, Clone)]
pub enum Term {
  Number(Token),
  Ident(Token),
  Paren(ExprId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
}

#[derive(Debug, Clone)]
pub enum Expr {
  Term(TermId),
  Binary { op: BinOp, lhs: ExprId, rhs: ExprId },
}

/// Statements as produced by the parser. `If` and `Else` bodies always
/// reference a `Scope` statement.
#[derive(Debug, Clone)]
pub enum Stmt {
  Exit(ExprId),
  Let { name: Token, value: ExprId },
  Assign { name: Token, value: ExprId },
  Scope(Vec<StmtId>),
  If { cond: ExprId, body: StmtId },
  Else { body: StmtId },
}

/// Ordered top-level statement list.
#[derive(Debug, Default)]
pub struct Program {
  pub stmts: Vec<StmtId>,
}

/// Owns the arenas behind every node id in a parsed program.
#[derive(Debug, Default)]
pub struct Ast {
  terms: Arena<Term>,
  exprs: Arena<Expr>,
  stmts: Arena<Stmt>,
}

impl Ast {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn alloc_term(&mut self, term: Term) -> TermId {
    self.terms.alloc(term)
  }

  pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
    self.exprs.alloc(expr)
  }

  pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
    self.stmts.alloc(stmt)
  }

  pub fn term(&self, id: TermId) -> &Term {
    &self.terms[id]
  }

  pub fn expr(&self, id: ExprId) -> &Expr {
    &self.exprs[id]
  }

  pub fn stmt(&self, id: StmtId) -> &Stmt {
    &self.stmts[id]
  }
}
