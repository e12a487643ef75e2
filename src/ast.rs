//! Abstract Syntax Tree (AST) for Lumen
//!
//! The AST represents the structure of a Lumen program after parsing. Every
//! node is allocated in a [`NodeArena`](crate::arena::NodeArena); edges are
//! shared references into it, and identifier and literal text borrow from the
//! source, so the tree carries one lifetime `'a` covering both.

use crate::span::Span;
use crate::token::TokenKind;

/// A complete Lumen program
#[derive(Debug, Clone)]
pub struct Program<'a> {
    pub stmts: Vec<&'a Stmt<'a>>,
    pub span: Span,
}

/// A statement
#[derive(Debug, Clone, Copy)]
pub enum Stmt<'a> {
    /// Exit statement: `exit(expr);`
    Exit(ExitStmt<'a>),

    /// Variable binding: `let x = expr;`
    Let(LetStmt<'a>),

    /// Block of statements: `{ ... }`
    Scope(&'a Scope<'a>),

    /// Conditional: `if (cond) { ... }` with an optional `elif`/`else` chain
    If(IfStmt<'a>),
}

impl<'a> Stmt<'a> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Exit(e) => e.span,
            Stmt::Let(l) => l.span,
            Stmt::Scope(s) => s.span,
            Stmt::If(i) => i.span,
        }
    }
}

// ============ Statements ============

/// Exit statement: `exit(expr);`
#[derive(Debug, Clone, Copy)]
pub struct ExitStmt<'a> {
    pub expr: &'a Expr<'a>,
    pub span: Span,
}

/// Variable binding: `let x = expr;`
#[derive(Debug, Clone, Copy)]
pub struct LetStmt<'a> {
    pub name: Ident<'a>,
    pub expr: &'a Expr<'a>,
    pub span: Span,
}

/// A lexical block: `{ stmt* }`
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub stmts: &'a [&'a Stmt<'a>],
    pub span: Span,
}

/// Conditional statement head: `if (cond) scope` plus the predicate chain
#[derive(Debug, Clone, Copy)]
pub struct IfStmt<'a> {
    pub cond: &'a Expr<'a>,
    pub then: &'a Scope<'a>,
    pub pred: Option<&'a IfPred<'a>>,
    pub span: Span,
}

/// One link of an `elif`/`else` chain
#[derive(Debug, Clone, Copy)]
pub enum IfPred<'a> {
    /// `elif (cond) scope`, optionally followed by the rest of the chain
    Elif {
        cond: &'a Expr<'a>,
        scope: &'a Scope<'a>,
        next: Option<&'a IfPred<'a>>,
        span: Span,
    },

    /// Terminating `else scope`
    Else { scope: &'a Scope<'a>, span: Span },
}

impl<'a> IfPred<'a> {
    pub fn span(&self) -> Span {
        match self {
            IfPred::Elif { span, .. } => *span,
            IfPred::Else { span, .. } => *span,
        }
    }
}

// ============ Expressions ============

/// An expression
#[derive(Debug, Clone, Copy)]
pub enum Expr<'a> {
    /// A single term
    Term(&'a Term<'a>),

    /// A binary operation
    Binary(BinExpr<'a>),
}

impl<'a> Expr<'a> {
    pub fn span(&self) -> Span {
        match self {
            Expr::Term(t) => t.span(),
            Expr::Binary(b) => b.span,
        }
    }
}

/// A binary operation: `lhs op rhs`
#[derive(Debug, Clone, Copy)]
pub struct BinExpr<'a> {
    pub op: BinOp,
    pub lhs: &'a Expr<'a>,
    pub rhs: &'a Expr<'a>,
    pub span: Span,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    /// Map an operator token to its binary operator, if it is one.
    pub fn from_token(kind: TokenKind) -> Option<BinOp> {
        match kind {
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            TokenKind::Star => Some(BinOp::Mul),
            TokenKind::Slash => Some(BinOp::Div),
            _ => None,
        }
    }

    /// Binding strength used by precedence climbing: `*` and `/` bind
    /// tighter than `+` and `-`.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Mul | BinOp::Div => 1,
            BinOp::Add | BinOp::Sub => 0,
        }
    }
}

/// The smallest expression unit
#[derive(Debug, Clone, Copy)]
pub enum Term<'a> {
    /// Integer literal, kept as source text
    IntLiteral { value: &'a str, span: Span },

    /// Variable reference
    Ident(Ident<'a>),

    /// Parenthesized expression: `( expr )`
    Paren { expr: &'a Expr<'a>, span: Span },
}

impl<'a> Term<'a> {
    pub fn span(&self) -> Span {
        match self {
            Term::IntLiteral { span, .. } => *span,
            Term::Ident(ident) => ident.span,
            Term::Paren { span, .. } => *span,
        }
    }
}

/// An identifier with its source location
#[derive(Debug, Clone, Copy)]
pub struct Ident<'a> {
    pub name: &'a str,
    pub span: Span,
}
