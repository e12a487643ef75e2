//! Code generation for Lumen
//!
//! Walks the syntax tree and emits NASM x86-64 text. Expressions evaluate
//! on the machine stack: every term pushes one 8-byte slot, every binary
//! operation pops two slots and pushes one. A variable simply is the slot
//! its initializer pushed, addressed relative to `rsp`, so lexical scoping
//! reduces to bookkeeping on the stack depth.

use crate::ast::{BinExpr, BinOp, Expr, IfPred, IfStmt, LetStmt, Program, Scope, Stmt, Term};
use crate::span::Span;
use thiserror::Error;

/// Semantic errors detected during generation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("identifier `{name}` does not exist")]
    UndeclaredIdentifier { name: String, span: Span },

    #[error("identifier `{name}` already exists")]
    DuplicateIdentifier { name: String, span: Span },
}

impl SemanticError {
    pub fn span(&self) -> Span {
        match self {
            SemanticError::UndeclaredIdentifier { span, .. } => *span,
            SemanticError::DuplicateIdentifier { span, .. } => *span,
        }
    }
}

/// Width of one stack slot in bytes
const SLOT_WIDTH: usize = 8;

/// Generate assembly text for `program`.
///
/// Returns the complete program text or the first semantic error; nothing
/// is emitted to the caller on failure.
pub fn generate(program: &Program<'_>) -> Result<String, SemanticError> {
    Generator::new().gen_program(program)
}

/// A declared variable: the `stack_size` recorded at its declaration
struct Var<'a> {
    name: &'a str,
    stack_loc: usize,
}

/// The code generator for Lumen
pub struct Generator<'a> {
    output: String,
    stack_size: usize,
    vars: Vec<Var<'a>>,
    scopes: Vec<usize>,
    label_count: usize,
}

impl<'a> Generator<'a> {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            stack_size: 0,
            vars: Vec::new(),
            scopes: Vec::new(),
            label_count: 0,
        }
    }

    /// Generate the whole program: entry prologue, every statement in
    /// order, then the implicit `exit(0)` trailer. The trailer is dead
    /// code whenever the source already exited, which is fine.
    pub fn gen_program(mut self, program: &Program<'a>) -> Result<String, SemanticError> {
        self.output.push_str("global _start\n_start:\n");
        for &stmt in &program.stmts {
            self.gen_stmt(stmt)?;
        }
        self.emit("mov rax, 60");
        self.emit("mov rdi, 0");
        self.emit("syscall");
        Ok(self.output)
    }

    // ============ Statements ============

    fn gen_stmt(&mut self, stmt: &'a Stmt<'a>) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Exit(exit) => {
                self.gen_expr(exit.expr)?;
                self.emit("mov rax, 60");
                self.pop("rdi");
                self.emit("syscall");
                Ok(())
            }
            Stmt::Let(let_stmt) => self.gen_let(let_stmt),
            Stmt::Scope(scope) => self.gen_scope(scope),
            Stmt::If(if_stmt) => self.gen_if(if_stmt),
        }
    }

    /// Declare a variable. The initializer's pushed result becomes the
    /// variable's storage slot; no copy is made. The name is recorded
    /// only after the initializer is emitted, so it is not visible
    /// inside its own initializer.
    fn gen_let(&mut self, let_stmt: &'a LetStmt<'a>) -> Result<(), SemanticError> {
        if self.vars.iter().any(|var| var.name == let_stmt.name.name) {
            return Err(SemanticError::DuplicateIdentifier {
                name: let_stmt.name.name.to_string(),
                span: let_stmt.name.span,
            });
        }
        self.gen_expr(let_stmt.expr)?;
        self.vars.push(Var {
            name: let_stmt.name.name,
            stack_loc: self.stack_size - 1,
        });
        Ok(())
    }

    fn gen_scope(&mut self, scope: &'a Scope<'a>) -> Result<(), SemanticError> {
        self.begin_scope();
        for &stmt in scope.stmts {
            self.gen_stmt(stmt)?;
        }
        self.end_scope();
        Ok(())
    }

    /// Open a lexical block: remember how many variables exist right now.
    fn begin_scope(&mut self) {
        self.scopes.push(self.vars.len());
    }

    /// Close a lexical block: discard every slot declared since the
    /// matching `begin_scope` with a single stack adjustment.
    fn end_scope(&mut self) {
        if let Some(checkpoint) = self.scopes.pop() {
            let pop_count = self.vars.len() - checkpoint;
            if pop_count > 0 {
                self.emit(&format!("add rsp, {}", pop_count * SLOT_WIDTH));
                self.stack_size -= pop_count;
            }
            self.vars.truncate(checkpoint);
        }
    }

    /// Emit a conditional. A false test jumps past the scope to a fresh
    /// label; when an `elif`/`else` chain follows, the taken branch jumps
    /// to the chain's shared end label instead of falling through.
    fn gen_if(&mut self, if_stmt: &'a IfStmt<'a>) -> Result<(), SemanticError> {
        self.gen_expr(if_stmt.cond)?;
        self.pop("rax");
        let false_label = self.create_label();
        self.emit("test rax, rax");
        self.emit(&format!("jz {}", false_label));
        self.gen_scope(if_stmt.then)?;

        match if_stmt.pred {
            Some(pred) => {
                let end_label = self.create_label();
                self.emit(&format!("jmp {}", end_label));
                self.place_label(&false_label);
                self.gen_if_pred(pred, &end_label)?;
                self.place_label(&end_label);
            }
            None => self.place_label(&false_label),
        }
        Ok(())
    }

    /// Emit one link of an `elif`/`else` chain. Every `elif` defines its
    /// false label, so a failed final test falls through to `end_label`.
    fn gen_if_pred(&mut self, pred: &'a IfPred<'a>, end_label: &str) -> Result<(), SemanticError> {
        match pred {
            IfPred::Elif {
                cond, scope, next, ..
            } => {
                self.gen_expr(cond)?;
                self.pop("rax");
                let false_label = self.create_label();
                self.emit("test rax, rax");
                self.emit(&format!("jz {}", false_label));
                self.gen_scope(scope)?;
                self.emit(&format!("jmp {}", end_label));
                self.place_label(&false_label);
                if let Some(next) = next {
                    self.gen_if_pred(next, end_label)?;
                }
                Ok(())
            }
            IfPred::Else { scope, .. } => self.gen_scope(scope),
        }
    }

    // ============ Expressions ============

    fn gen_expr(&mut self, expr: &'a Expr<'a>) -> Result<(), SemanticError> {
        match expr {
            Expr::Term(term) => self.gen_term(term),
            Expr::Binary(bin) => self.gen_bin_expr(bin),
        }
    }

    /// Emit a binary operation. The right operand is evaluated first, so
    /// after the two pops `rax` holds the left value and `rbx` the right.
    fn gen_bin_expr(&mut self, bin: &'a BinExpr<'a>) -> Result<(), SemanticError> {
        self.gen_expr(bin.rhs)?;
        self.gen_expr(bin.lhs)?;
        self.pop("rax");
        self.pop("rbx");
        match bin.op {
            BinOp::Add => self.emit("add rax, rbx"),
            BinOp::Sub => self.emit("sub rax, rbx"),
            BinOp::Mul => self.emit("mul rbx"),
            BinOp::Div => {
                // div takes its dividend in rdx:rax
                self.emit("xor rdx, rdx");
                self.emit("div rbx");
            }
        }
        self.push("rax");
        Ok(())
    }

    fn gen_term(&mut self, term: &'a Term<'a>) -> Result<(), SemanticError> {
        match term {
            Term::IntLiteral { value, .. } => {
                self.emit(&format!("mov rax, {}", value));
                self.push("rax");
                Ok(())
            }
            Term::Ident(ident) => {
                let stack_loc = self
                    .vars
                    .iter()
                    .find(|var| var.name == ident.name)
                    .map(|var| var.stack_loc)
                    .ok_or_else(|| SemanticError::UndeclaredIdentifier {
                        name: ident.name.to_string(),
                        span: ident.span,
                    })?;
                let offset = (self.stack_size - stack_loc - 1) * SLOT_WIDTH;
                self.push(&format!("QWORD [rsp + {}]", offset));
                Ok(())
            }
            Term::Paren { expr, .. } => self.gen_expr(expr),
        }
    }

    // ============ Emission helpers ============

    /// Push an operand onto the machine stack.
    fn push(&mut self, operand: &str) {
        self.emit(&format!("push {}", operand));
        self.stack_size += 1;
    }

    /// Pop the top of the machine stack into a register.
    fn pop(&mut self, register: &str) {
        self.emit(&format!("pop {}", register));
        self.stack_size -= 1;
    }

    /// Mint a fresh `labelN` name, unique within this generation run.
    fn create_label(&mut self) -> String {
        let label = format!("label{}", self.label_count);
        self.label_count += 1;
        label
    }

    /// Write one indented instruction line.
    fn emit(&mut self, instruction: &str) {
        self.output.push_str("    ");
        self.output.push_str(instruction);
        self.output.push('\n');
    }

    /// Write a label definition at column zero.
    fn place_label(&mut self, label: &str) {
        self.output.push_str(label);
        self.output.push_str(":\n");
    }
}

impl<'a> Default for Generator<'a> {
    fn default() -> Self {
        Self::new()
    }
}
