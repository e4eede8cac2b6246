//! Code generation: lower the parsed program into NASM x86-64 assembly.
//!
//! The emitter is a stack machine: every expression leaves exactly one
//! value on the machine stack and every consumer pops what it needs.
//! `stack_size` mirrors the number of live slots along the emission path,
//! so identifier references resolve to `rsp`-relative offsets without a
//! frame pointer. Scopes record how many variables they introduced and
//! reclaim those slots with a single `add rsp` on exit, which restores
//! the model before the next statement is lowered.

use crate::ast::{Ast, BinOp, Expr, ExprId, Program, Stmt, StmtId, Term, TermId};
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::Token;

const SLOT_SIZE: usize = 8;

/// Emit assembly for a whole program. Takes the arena by move; the AST is
/// dropped with the generator once the text is produced.
pub fn generate(ast: Ast, program: &Program) -> CompileResult<String> {
  Generator::new(ast).generate(program)
}

struct Variable {
  name: String,
  stack_pos: usize,
}

struct Generator {
  ast: Ast,
  asm: String,
  stack_size: usize,
  vars: Vec<Variable>,
  scopes: Vec<usize>,
  label_count: usize,
  has_exit: bool,
}

impl Generator {
  fn new(ast: Ast) -> Self {
    Self {
      ast,
      asm: String::new(),
      stack_size: 0,
      vars: Vec::new(),
      scopes: Vec::new(),
      label_count: 0,
      has_exit: false,
    }
  }

  fn generate(mut self, program: &Program) -> CompileResult<String> {
    self.asm.push_str("global _start\n_start:\n");

    for &stmt in &program.stmts {
      self.gen_stmt(stmt)?;
    }

    // A program that never lowered an `exit` falls back to status 0. Any
    // lowered `exit` suppresses this, including one inside a conditional
    // body that may never run.
    if !self.has_exit {
      self.asm.push_str("    mov rax, 60\n");
      self.asm.push_str("    mov rdi, 0\n");
      self.asm.push_str("    syscall\n");
    }

    Ok(self.asm)
  }

  fn gen_stmt(&mut self, id: StmtId) -> CompileResult<()> {
    let stmt = self.ast.stmt(id).clone();
    match stmt {
      Stmt::Exit(value) => {
        self.gen_expr(value)?;
        self.asm.push_str("    mov rax, 60\n");
        self.pop("rdi");
        self.asm.push_str("    syscall\n");
        self.has_exit = true;
      }
      Stmt::Let { name, value } => {
        if self.vars.iter().any(|var| var.name == name.value) {
          return Err(CompileError::Redeclaration { name: name.value });
        }
        // The slot pushed by the initializer becomes the variable's home.
        self.vars.push(Variable {
          name: name.value,
          stack_pos: self.stack_size,
        });
        self.gen_expr(value)?;
      }
      Stmt::Assign { name, value } => {
        self.gen_expr(value)?;
        self.pop("rax");
        let offset = self.var_offset(&name)?;
        self.asm.push_str(&format!("    mov QWORD [rsp + {offset}], rax\n"));
      }
      Stmt::Scope(stmts) => {
        self.begin_scope();
        for stmt in stmts {
          self.gen_stmt(stmt)?;
        }
        self.end_scope();
      }
      Stmt::If { cond, body } => {
        self.gen_expr(cond)?;
        self.pop("rax");
        self.asm.push_str("    cmp rax, 0\n");
        let label = self.create_label();
        self.asm.push_str(&format!("    je {label}\n"));
        self.gen_stmt(body)?;
        self.asm.push_str(&format!("\n{label}:\n"));
      }
      // A standalone `else` has no condition to test; its scope is
      // lowered unconditionally.
      Stmt::Else { body } => {
        self.gen_stmt(body)?;
      }
    }
    Ok(())
  }

  fn gen_expr(&mut self, id: ExprId) -> CompileResult<()> {
    let expr = self.ast.expr(id).clone();
    match expr {
      Expr::Term(term) => self.gen_term(term),
      Expr::Binary { op, lhs, rhs } => {
        self.gen_expr(lhs)?;
        self.gen_expr(rhs)?;
        match op {
          BinOp::Add => {
            self.pop("rax");
            self.pop("rbx");
            self.asm.push_str("    add rax, rbx\n");
            self.push("rax");
          }
          BinOp::Sub => {
            self.pop("rax");
            self.pop("rbx");
            self.asm.push_str("    sub rbx, rax\n");
            self.push("rbx");
          }
          BinOp::Mul => {
            self.pop("rax");
            self.pop("rbx");
            self.asm.push_str("    mul rbx\n");
            self.push("rax");
          }
          // Division pops the divisor first; the dividend must land in
          // `rax` with `rdx` cleared before `div`.
          BinOp::Div => {
            self.pop("rbx");
            self.pop("rax");
            self.asm.push_str("    xor rdx, rdx\n");
            self.asm.push_str("    div rbx\n");
            self.push("rax");
          }
        }
        Ok(())
      }
    }
  }

  fn gen_term(&mut self, id: TermId) -> CompileResult<()> {
    let term = self.ast.term(id).clone();
    match term {
      Term::Number(token) => {
        self.asm.push_str(&format!("    mov rax, {}\n", token.value));
        self.push("rax");
        Ok(())
      }
      Term::Ident(token) => {
        let offset = self.var_offset(&token)?;
        self.push(&format!("QWORD [rsp + {offset}]"));
        Ok(())
      }
      Term::Paren(expr) => self.gen_expr(expr),
    }
  }

  /// Resolve an identifier to the byte offset of its slot from `rsp`.
  ///
  /// First match in insertion order; duplicate `let` is rejected, so the
  /// live set never holds two variables with one name. A variable whose
  /// slot has not been pushed yet (a `let` initializer referring to the
  /// name it introduces) does not resolve.
  fn var_offset(&self, name: &Token) -> CompileResult<usize> {
    let var = self
      .vars
      .iter()
      .find(|var| var.name == name.value && var.stack_pos < self.stack_size)
      .ok_or_else(|| CompileError::UndefinedIdent {
        name: name.value.clone(),
      })?;
    Ok((self.stack_size - var.stack_pos - 1) * SLOT_SIZE)
  }

  fn push(&mut self, operand: &str) {
    self.asm.push_str(&format!("    push {operand}\n"));
    self.stack_size += 1;
  }

  fn pop(&mut self, register: &str) {
    self.asm.push_str(&format!("    pop {register}\n"));
    self.stack_size -= 1;
  }

  fn begin_scope(&mut self) {
    self.scopes.push(self.vars.len());
  }

  /// Drop every variable introduced since the matching `begin_scope` and
  /// reclaim their slots in one instruction.
  fn end_scope(&mut self) {
    let mark = self.scopes.pop().unwrap_or(0);
    let count = self.vars.len() - mark;
    self
      .asm
      .push_str(&format!("    add rsp, {}\n", count * SLOT_SIZE));
    self.stack_size -= count;
    self.vars.truncate(mark);
  }

  fn create_label(&mut self) -> String {
    let label = format!("label_{}", self.label_count);
    self.label_count += 1;
    label
  }
}
