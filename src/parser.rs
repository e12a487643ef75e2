//! Parser for Lumen
//!
//! This is a recursive descent parser that converts tokens into an AST
//! allocated in a [`NodeArena`]. Expressions are parsed by precedence
//! climbing so `*` and `/` bind tighter than `+` and `-` and chains of
//! equal precedence associate to the left.

use crate::arena::NodeArena;
use crate::ast::{
    BinExpr, BinOp, ExitStmt, Expr, Ident, IfPred, IfStmt, LetStmt, Program, Scope, Stmt, Term,
};
use crate::span::Span;
use crate::token::{Token, TokenKind};
use thiserror::Error;

/// Parser errors
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        span: Span,
    },

    #[error("unexpected end of file")]
    UnexpectedEof { span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span } => *span,
        }
    }
}

/// Parse result
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a token sequence into a [`Program`] whose nodes live in `arena`.
///
/// Stops at the first malformed construct; there is no error recovery.
pub fn parse<'a>(
    tokens: Vec<Token>,
    source: &'a str,
    arena: &'a NodeArena,
) -> ParseResult<Program<'a>> {
    Parser::new(tokens, source, arena).parse_program()
}

/// The parser for Lumen
pub struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    source: &'a str,
    arena: &'a NodeArena,
}

impl<'a> Parser<'a> {
    /// Create a new parser. The sequence is closed with an `Eof` token if
    /// the caller did not.
    pub fn new(mut tokens: Vec<Token>, source: &'a str, arena: &'a NodeArena) -> Self {
        if !matches!(tokens.last(), Some(token) if token.kind == TokenKind::Eof) {
            let pos = source.len();
            tokens.push(Token::new(TokenKind::Eof, Span::new(pos, pos)));
        }
        Self {
            tokens,
            index: 0,
            source,
            arena,
        }
    }

    /// Look ahead `n` tokens without consuming (0 = current). Saturates at
    /// the trailing `Eof` token.
    fn peek_nth(&self, n: usize) -> &Token {
        let idx = (self.index + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// The token at the cursor
    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    /// The most recently consumed token
    fn previous(&self) -> &Token {
        &self.tokens[self.index.saturating_sub(1)]
    }

    /// Return the current token and advance; the cursor never moves past
    /// the trailing `Eof`.
    fn advance(&mut self) -> Token {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        token
    }

    /// Check if the current token matches
    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Check if at end of file
    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume the current token if it matches, otherwise error
    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else if self.is_at_end() {
            Err(ParseError::UnexpectedEof {
                span: self.peek().span,
            })
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("{}", kind),
                found: self.peek().kind,
                span: self.peek().span,
            })
        }
    }

    /// Consume the current token only if it matches
    fn consume(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Get text of a token
    fn text(&self, token: &Token) -> &'a str {
        token.text(self.source)
    }

    // ============ Top-level parsing ============

    /// Parse a complete program
    pub fn parse_program(&mut self) -> ParseResult<Program<'a>> {
        let start = self.peek().span.start;
        let mut stmts = Vec::new();

        while !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }

        let end = self.previous().span.end;
        Ok(Program {
            stmts,
            span: Span::new(start, end),
        })
    }

    // ============ Statements ============

    /// Parse a single statement
    fn parse_stmt(&mut self) -> ParseResult<&'a Stmt<'a>> {
        match self.peek().kind {
            TokenKind::Exit => self.parse_exit_stmt(),
            TokenKind::Let => self.parse_let_stmt(),
            TokenKind::LBrace => {
                let scope = self.parse_scope()?;
                Ok(self.arena.alloc(Stmt::Scope(scope)))
            }
            TokenKind::If => self.parse_if_stmt(),
            found => Err(ParseError::UnexpectedToken {
                expected: "statement".to_string(),
                found,
                span: self.peek().span,
            }),
        }
    }

    /// Parse `exit ( expr ) ;`
    fn parse_exit_stmt(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let keyword = self.advance();
        self.expect(TokenKind::LParen)?;
        let expr = self.parse_expr(0)?;
        self.expect(TokenKind::RParen)?;
        let semi = self.expect(TokenKind::Semicolon)?;
        Ok(self.arena.alloc(Stmt::Exit(ExitStmt {
            expr,
            span: keyword.span.merge(semi.span),
        })))
    }

    /// Parse `let IDENT = expr ;`
    fn parse_let_stmt(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let keyword = self.advance();
        let name_token = self.expect(TokenKind::Ident)?;
        let name = Ident {
            name: self.text(&name_token),
            span: name_token.span,
        };
        self.expect(TokenKind::Eq)?;
        let expr = self.parse_expr(0)?;
        let semi = self.expect(TokenKind::Semicolon)?;
        Ok(self.arena.alloc(Stmt::Let(LetStmt {
            name,
            expr,
            span: keyword.span.merge(semi.span),
        })))
    }

    /// Parse `if ( expr ) scope` and its optional `elif`/`else` chain
    fn parse_if_stmt(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let keyword = self.advance();
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::RParen)?;
        let then = self.parse_scope()?;
        let pred = self.parse_if_pred()?;
        let end = match pred {
            Some(pred) => pred.span(),
            None => then.span,
        };
        Ok(self.arena.alloc(Stmt::If(IfStmt {
            cond,
            then,
            pred,
            span: keyword.span.merge(end),
        })))
    }

    /// Parse the `elif`/`else` chain following an `if`, if present.
    /// The chain is built back to front, so every node is complete at
    /// construction.
    fn parse_if_pred(&mut self) -> ParseResult<Option<&'a IfPred<'a>>> {
        if let Some(keyword) = self.consume(TokenKind::Elif) {
            self.expect(TokenKind::LParen)?;
            let cond = self.parse_expr(0)?;
            self.expect(TokenKind::RParen)?;
            let scope = self.parse_scope()?;
            let next = self.parse_if_pred()?;
            let end = match next {
                Some(next) => next.span(),
                None => scope.span,
            };
            return Ok(Some(self.arena.alloc(IfPred::Elif {
                cond,
                scope,
                next,
                span: keyword.span.merge(end),
            })));
        }

        if let Some(keyword) = self.consume(TokenKind::Else) {
            let scope = self.parse_scope()?;
            return Ok(Some(self.arena.alloc(IfPred::Else {
                scope,
                span: keyword.span.merge(scope.span),
            })));
        }

        Ok(None)
    }

    /// Parse `{ stmt* }`
    fn parse_scope(&mut self) -> ParseResult<&'a Scope<'a>> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(self.arena.alloc(Scope {
            stmts: self.arena.alloc_slice(&stmts),
            span: open.span.merge(close.span),
        }))
    }

    // ============ Expressions ============

    /// Parse an expression by precedence climbing: keep folding binary
    /// operators whose precedence is at least `min_prec`, parsing each
    /// right operand with a higher minimum so equal precedence associates
    /// left.
    fn parse_expr(&mut self, min_prec: u8) -> ParseResult<&'a Expr<'a>> {
        let term = self.parse_term()?;
        let mut lhs: &'a Expr<'a> = self.arena.alloc(Expr::Term(term));

        loop {
            let op = match BinOp::from_token(self.peek().kind) {
                Some(op) if op.precedence() >= min_prec => op,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_expr(op.precedence() + 1)?;
            let span = lhs.span().merge(rhs.span());
            lhs = self.arena.alloc(Expr::Binary(BinExpr { op, lhs, rhs, span }));
        }

        Ok(lhs)
    }

    /// Parse `INT | IDENT | ( expr )`
    fn parse_term(&mut self) -> ParseResult<&'a Term<'a>> {
        let token = *self.peek();
        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                Ok(self.arena.alloc(Term::IntLiteral {
                    value: self.text(&token),
                    span: token.span,
                }))
            }
            TokenKind::Ident => {
                self.advance();
                Ok(self.arena.alloc(Term::Ident(Ident {
                    name: self.text(&token),
                    span: token.span,
                })))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr(0)?;
                let close = self.expect(TokenKind::RParen)?;
                Ok(self.arena.alloc(Term::Paren {
                    expr,
                    span: token.span.merge(close.span),
                }))
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof { span: token.span }),
            found => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found,
                span: token.span,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn parse_ok<'a>(source: &'a str, arena: &'a NodeArena) -> Program<'a> {
        let tokens = lexer::tokenize(source).expect("lexing failed");
        parse(tokens, source, arena).unwrap_or_else(|e| panic!("parse error: {e}"))
    }

    fn parse_err(source: &str) -> ParseError {
        let arena = NodeArena::new();
        let tokens = lexer::tokenize(source).expect("lexing failed");
        match parse(tokens, source, &arena) {
            Ok(_) => panic!("expected parse error for {source:?}"),
            Err(e) => e,
        }
    }

    fn exit_expr<'a>(program: &Program<'a>) -> &'a Expr<'a> {
        match program.stmts[0] {
            Stmt::Exit(exit) => exit.expr,
            other => panic!("expected exit statement, got {other:?}"),
        }
    }

    fn int_value<'a>(expr: &Expr<'a>) -> &'a str {
        match expr {
            Expr::Term(Term::IntLiteral { value, .. }) => value,
            other => panic!("expected integer literal, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_program() {
        let arena = NodeArena::new();
        let program = parse_ok("", &arena);
        assert!(program.stmts.is_empty());
    }

    #[test]
    fn test_exit_statement() {
        let arena = NodeArena::new();
        let source = "exit(42);";
        let program = parse_ok(source, &arena);
        assert_eq!(program.stmts.len(), 1);
        let expr = exit_expr(&program);
        assert_eq!(int_value(expr), "42");
        assert_eq!(program.stmts[0].span().text(source), "exit(42);");
    }

    #[test]
    fn test_let_statement() {
        let arena = NodeArena::new();
        let source = "let x = 7;";
        let program = parse_ok(source, &arena);
        match program.stmts[0] {
            Stmt::Let(let_stmt) => {
                assert_eq!(let_stmt.name.name, "x");
                assert_eq!(let_stmt.name.span.text(source), "x");
                assert_eq!(int_value(let_stmt.expr), "7");
                assert_eq!(let_stmt.span.text(source), "let x = 7;");
            }
            other => panic!("expected let statement, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence_mul_binds_tighter() {
        let arena = NodeArena::new();
        let program = parse_ok("exit(2 + 3 * 4);", &arena);
        match exit_expr(&program) {
            Expr::Binary(add) => {
                assert_eq!(add.op, BinOp::Add);
                assert_eq!(int_value(add.lhs), "2");
                match add.rhs {
                    Expr::Binary(mul) => {
                        assert_eq!(mul.op, BinOp::Mul);
                        assert_eq!(int_value(mul.lhs), "3");
                        assert_eq!(int_value(mul.rhs), "4");
                    }
                    other => panic!("expected multiplication on the right, got {other:?}"),
                }
            }
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_grouping_overrides_precedence() {
        let arena = NodeArena::new();
        let program = parse_ok("exit((2 + 3) * 4);", &arena);
        match exit_expr(&program) {
            Expr::Binary(mul) => {
                assert_eq!(mul.op, BinOp::Mul);
                assert_eq!(int_value(mul.rhs), "4");
                match mul.lhs {
                    Expr::Term(Term::Paren { expr, .. }) => match expr {
                        Expr::Binary(add) => {
                            assert_eq!(add.op, BinOp::Add);
                            assert_eq!(int_value(add.lhs), "2");
                            assert_eq!(int_value(add.rhs), "3");
                        }
                        other => panic!("expected addition inside parens, got {other:?}"),
                    },
                    other => panic!("expected parenthesized left operand, got {other:?}"),
                }
            }
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_left_associativity() {
        let arena = NodeArena::new();
        let program = parse_ok("exit(1 - 2 - 3);", &arena);
        match exit_expr(&program) {
            Expr::Binary(outer) => {
                assert_eq!(outer.op, BinOp::Sub);
                assert_eq!(int_value(outer.rhs), "3");
                match outer.lhs {
                    Expr::Binary(inner) => {
                        assert_eq!(inner.op, BinOp::Sub);
                        assert_eq!(int_value(inner.lhs), "1");
                        assert_eq!(int_value(inner.rhs), "2");
                    }
                    other => panic!("expected nested subtraction, got {other:?}"),
                }
            }
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_same_precedence_div_then_mul() {
        let arena = NodeArena::new();
        let program = parse_ok("exit(8 / 4 * 2);", &arena);
        match exit_expr(&program) {
            Expr::Binary(mul) => {
                assert_eq!(mul.op, BinOp::Mul);
                assert_eq!(int_value(mul.rhs), "2");
                match mul.lhs {
                    Expr::Binary(div) => {
                        assert_eq!(div.op, BinOp::Div);
                        assert_eq!(int_value(div.lhs), "8");
                        assert_eq!(int_value(div.rhs), "4");
                    }
                    other => panic!("expected division on the left, got {other:?}"),
                }
            }
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_precedence_chain() {
        let arena = NodeArena::new();
        let program = parse_ok("exit(1 + 2 * 3 - 4);", &arena);
        // (1 + (2 * 3)) - 4
        match exit_expr(&program) {
            Expr::Binary(sub) => {
                assert_eq!(sub.op, BinOp::Sub);
                assert_eq!(int_value(sub.rhs), "4");
                match sub.lhs {
                    Expr::Binary(add) => {
                        assert_eq!(add.op, BinOp::Add);
                        assert_eq!(int_value(add.lhs), "1");
                        match add.rhs {
                            Expr::Binary(mul) => assert_eq!(mul.op, BinOp::Mul),
                            other => panic!("expected multiplication, got {other:?}"),
                        }
                    }
                    other => panic!("expected addition, got {other:?}"),
                }
            }
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_identifier_term() {
        let arena = NodeArena::new();
        let program = parse_ok("exit(total);", &arena);
        match exit_expr(&program) {
            Expr::Term(Term::Ident(ident)) => assert_eq!(ident.name, "total"),
            other => panic!("expected identifier, got {other:?}"),
        }
    }

    #[test]
    fn test_scope_statement() {
        let arena = NodeArena::new();
        let source = "{ let x = 1; exit(x); }";
        let program = parse_ok(source, &arena);
        match program.stmts[0] {
            Stmt::Scope(scope) => {
                assert_eq!(scope.stmts.len(), 2);
                assert!(matches!(scope.stmts[0], Stmt::Let(_)));
                assert!(matches!(scope.stmts[1], Stmt::Exit(_)));
                assert_eq!(scope.span.text(source), source);
            }
            other => panic!("expected scope, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_and_nested_scopes() {
        let arena = NodeArena::new();
        let program = parse_ok("{ { } }", &arena);
        match program.stmts[0] {
            Stmt::Scope(outer) => {
                assert_eq!(outer.stmts.len(), 1);
                match outer.stmts[0] {
                    Stmt::Scope(inner) => assert!(inner.stmts.is_empty()),
                    other => panic!("expected nested scope, got {other:?}"),
                }
            }
            other => panic!("expected scope, got {other:?}"),
        }
    }

    #[test]
    fn test_if_without_chain() {
        let arena = NodeArena::new();
        let program = parse_ok("if (1) { exit(2); }", &arena);
        match program.stmts[0] {
            Stmt::If(if_stmt) => {
                assert_eq!(int_value(if_stmt.cond), "1");
                assert_eq!(if_stmt.then.stmts.len(), 1);
                assert!(if_stmt.pred.is_none());
            }
            other => panic!("expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn test_if_elif_else_chain() {
        let arena = NodeArena::new();
        let source = "if (1) { } elif (2) { } else { exit(3); }";
        let program = parse_ok(source, &arena);
        let if_stmt = match program.stmts[0] {
            Stmt::If(if_stmt) => if_stmt,
            other => panic!("expected if statement, got {other:?}"),
        };
        let elif = match if_stmt.pred {
            Some(IfPred::Elif {
                cond, next, span, ..
            }) => {
                assert_eq!(int_value(cond), "2");
                assert_eq!(span.text(source), "elif (2) { } else { exit(3); }");
                next
            }
            other => panic!("expected elif link, got {other:?}"),
        };
        match elif {
            Some(IfPred::Else { scope, .. }) => assert_eq!(scope.stmts.len(), 1),
            other => panic!("expected else link, got {other:?}"),
        }
        assert_eq!(if_stmt.span.text(source), source);
    }

    #[test]
    fn test_elif_without_else() {
        let arena = NodeArena::new();
        let program = parse_ok("if (1) { } elif (2) { }", &arena);
        match program.stmts[0] {
            Stmt::If(IfStmt {
                pred: Some(IfPred::Elif { next: None, .. }),
                ..
            }) => {}
            other => panic!("expected trailing elif, got {other:?}"),
        }
    }

    #[test]
    fn test_program_span_covers_source() {
        let arena = NodeArena::new();
        let source = "let x = 1;\nexit(x);";
        let program = parse_ok(source, &arena);
        assert_eq!(program.span, Span::new(0, source.len()));
        assert_eq!(program.stmts.len(), 2);
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse_err("exit(1)");
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_missing_equals_in_let() {
        let err = parse_err("let x 5;");
        match err {
            ParseError::UnexpectedToken {
                expected, found, ..
            } => {
                assert_eq!(expected, "=");
                assert_eq!(found, TokenKind::IntLiteral);
            }
            other => panic!("expected unexpected-token error, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_scope() {
        let err = parse_err("{ exit(1);");
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_unmatched_paren() {
        let err = parse_err("exit((1);");
        match err {
            ParseError::UnexpectedToken { expected, .. } => assert_eq!(expected, ")"),
            other => panic!("expected unexpected-token error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_expression() {
        let err = parse_err("exit();");
        match err {
            ParseError::UnexpectedToken {
                expected, found, ..
            } => {
                assert_eq!(expected, "expression");
                assert_eq!(found, TokenKind::RParen);
            }
            other => panic!("expected unexpected-token error, got {other:?}"),
        }
    }

    #[test]
    fn test_exit_requires_parens() {
        let err = parse_err("exit 5;");
        match err {
            ParseError::UnexpectedToken { expected, .. } => assert_eq!(expected, "("),
            other => panic!("expected unexpected-token error, got {other:?}"),
        }
    }

    #[test]
    fn test_statement_position_garbage() {
        let err = parse_err("42;");
        match err {
            ParseError::UnexpectedToken {
                expected, found, ..
            } => {
                assert_eq!(expected, "statement");
                assert_eq!(found, TokenKind::IntLiteral);
            }
            other => panic!("expected unexpected-token error, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_input_is_rejected() {
        let err = parse_err("exit(1); }");
        match err {
            ParseError::UnexpectedToken {
                expected, found, ..
            } => {
                assert_eq!(expected, "statement");
                assert_eq!(found, TokenKind::RBrace);
            }
            other => panic!("expected unexpected-token error, got {other:?}"),
        }
    }

    #[test]
    fn test_else_requires_scope() {
        let err = parse_err("if (1) { } else exit(1);");
        match err {
            ParseError::UnexpectedToken {
                expected, found, ..
            } => {
                assert_eq!(expected, "{");
                assert_eq!(found, TokenKind::Exit);
            }
            other => panic!("expected unexpected-token error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_span_points_at_offender() {
        let source = "let x = ;";
        let err = parse_err(source);
        assert_eq!(err.span(), Span::new(8, 9));
    }
}
