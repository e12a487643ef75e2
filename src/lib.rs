//! Lumen Compiler
//!
//! Compiler for the Lumen programming language. A Lumen program computes
//! an integer and hands it to the operating system as its exit status;
//! the compiler turns it into a freestanding Linux x86-64 executable with
//! no runtime and no libc.
//!
//! Every stage returns the first error it finds. Later stages never run
//! on broken input, and a failed compilation produces no output at all.
//!
//! # Architecture
//!
//! ```text
//! Source Code (.lum)
//!       │
//!       ▼
//! ┌─────────────┐
//! │    Lexer    │  → Tokens
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   Parser    │  → AST (arena-allocated)
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Code Gen   │  → NASM x86-64
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  nasm + ld  │  → Executable
//! └─────────────┘
//! ```

use thiserror::Error;

pub mod lexer;
pub mod token;
pub mod span;
pub mod arena;
pub mod ast;
pub mod parser;
pub mod codegen;
pub mod assemble;

// Re-exports for convenience
pub use arena::NodeArena;
pub use span::Span;
pub use token::{Token, TokenKind};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extension for Lumen source files
pub const FILE_EXTENSION: &str = "lum";

/// An error from any stage of compilation
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] lexer::LexError),

    #[error(transparent)]
    Parse(#[from] parser::ParseError),

    #[error(transparent)]
    Semantic(#[from] codegen::SemanticError),
}

impl CompileError {
    /// Source location of the offending construct
    pub fn span(&self) -> Span {
        match self {
            CompileError::Lex(err) => err.span(),
            CompileError::Parse(err) => err.span(),
            CompileError::Semantic(err) => err.span(),
        }
    }
}

/// Compile Lumen source text to NASM assembly text.
///
/// Runs the lexer, parser, and code generator in order and stops at the
/// first error.
pub fn compile(source: &str) -> Result<String, CompileError> {
    let tokens = lexer::tokenize(source)?;
    let arena = NodeArena::new();
    let program = parser::parse(tokens, source, &arena)?;
    let asm = codegen::generate(&program)?;
    Ok(asm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_produces_complete_program() {
        let asm =
            compile("let x = 2; exit(x + 3);").unwrap_or_else(|e| panic!("compile error: {e}"));
        assert!(asm.starts_with("global _start\n_start:\n"));
        assert!(asm.ends_with("    mov rax, 60\n    mov rdi, 0\n    syscall\n"));
        assert!(asm.contains("    add rax, rbx\n"));
    }

    #[test]
    fn test_lex_error_surfaces() {
        let err = compile("exit(1 $ 2);").unwrap_err();
        assert!(matches!(err, CompileError::Lex(_)));
        assert_eq!(err.span(), Span::new(7, 8));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = compile("exit(1;").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn test_semantic_error_surfaces() {
        let err = compile("exit(missing);").unwrap_err();
        assert!(matches!(err, CompileError::Semantic(_)));
        assert_eq!(err.to_string(), "identifier `missing` does not exist");
    }

    #[test]
    fn test_failed_compile_returns_no_output() {
        assert!(compile("let x = 1; let x = 2;").is_err());
    }
}
