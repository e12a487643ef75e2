//! Token definitions for Lumen
//!
//! This module defines all the tokens that the lexer can produce.

use crate::span::Span;
use logos::{FilterResult, Logos};
use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Get the text of this token from source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// What went wrong inside the generated lexer, without a span.
/// [`tokenize`](crate::lexer::tokenize) attaches the span and converts
/// this into a [`LexError`](crate::lexer::LexError).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A character no rule matches
    #[default]
    UnexpectedChar,
    /// A `/*` with no closing `*/` before the end of input
    UnterminatedBlockComment,
}

/// All possible token types in Lumen
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
pub enum TokenKind {
    // ============ Keywords ============
    #[token("exit")]
    Exit,
    #[token("let")]
    Let,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,

    // ============ Literals ============
    /// Integer literal: unsigned decimal digits only
    #[regex(r"[0-9]+")]
    IntLiteral,

    // ============ Identifiers ============
    /// Identifier: an alphabetic character followed by alphanumerics
    #[regex(r"[A-Za-z][A-Za-z0-9]*")]
    Ident,

    // ============ Operators ============
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Eq,

    // ============ Delimiters ============
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // ============ Punctuation ============
    #[token(";")]
    Semicolon,

    // ============ Special ============
    /// Opening of a block comment. The callback consumes through the
    /// closing `*/`, so this variant itself is never produced.
    #[token("/*", skip_block_comment)]
    BlockComment,

    /// End of file
    Eof,
}

/// Consume a block comment body. The first `*/` closes the comment, so
/// block comments do not nest. A comment still open at the end of input
/// is a lexical error spanning from its `/*` to the end of the source.
fn skip_block_comment(lexer: &mut logos::Lexer<'_, TokenKind>) -> FilterResult<(), LexErrorKind> {
    match lexer.remainder().find("*/") {
        Some(end) => {
            lexer.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lexer.bump(lexer.remainder().len());
            FilterResult::Error(LexErrorKind::UnterminatedBlockComment)
        }
    }
}

impl TokenKind {
    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Exit
                | TokenKind::Let
                | TokenKind::If
                | TokenKind::Elif
                | TokenKind::Else
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Exit => "exit",
            TokenKind::Let => "let",
            TokenKind::If => "if",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::IntLiteral => "integer",
            TokenKind::Ident => "identifier",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Eq => "=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Semicolon => ";",
            TokenKind::BlockComment => "block comment",
            TokenKind::Eof => "end of file",
        };
        write!(f, "{}", s)
    }
}
