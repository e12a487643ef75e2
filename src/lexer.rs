//! Lexer for Lumen
//!
//! The lexer converts source code into a sequence of tokens. It uses the
//! `logos` crate for the character-level work; keywords, comments, and
//! whitespace rules live on [`TokenKind`](crate::token::TokenKind).

use crate::span::Span;
use crate::token::{LexErrorKind, Token, TokenKind};
use logos::Logos;
use thiserror::Error;

/// Lexer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character `{ch}`")]
    UnexpectedChar { ch: char, span: Span },

    #[error("unterminated block comment")]
    UnterminatedBlockComment { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedBlockComment { span } => *span,
        }
    }
}

/// Tokenize `source` into a complete token sequence ending with `Eof`.
///
/// Stops at the first lexical error; no tokens are returned for input
/// that does not lex in full.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start, range.end);
        match result {
            Ok(kind) => tokens.push(Token::new(kind, span)),
            Err(LexErrorKind::UnexpectedChar) => {
                let ch = source[range.start..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(LexError::UnexpectedChar { ch, span });
            }
            Err(LexErrorKind::UnterminatedBlockComment) => {
                return Err(LexError::UnterminatedBlockComment { span });
            }
        }
    }

    let pos = source.len();
    tokens.push(Token::new(TokenKind::Eof, Span::new(pos, pos)));
    Ok(tokens)
}
