//! Lumen Compiler CLI
//!
//! The `lumenc` command is the main entry point for the Lumen compiler.

use clap::{Parser, Subcommand};
use lumen::span::Position;
use lumen::{assemble, codegen, lexer, parser, NodeArena, Span, Token};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lumenc")]
#[command(version = lumen::VERSION)]
#[command(about = "The Lumen compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Lumen source file to a native executable
    Build {
        /// Input file to compile
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Emit tokens (for debugging)
        #[arg(long)]
        emit_tokens: bool,

        /// Emit AST (for debugging)
        #[arg(long)]
        emit_ast: bool,

        /// Emit generated assembly (for debugging)
        #[arg(long)]
        emit_asm: bool,

        /// Stop after writing the .asm file
        #[arg(long)]
        asm_only: bool,
    },

    /// Check a file for errors without compiling
    Check {
        /// Input file to check
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Tokenize a file and print tokens
    Tokenize {
        /// Input file to tokenize
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Parse a file and print AST
    Parse {
        /// Input file to parse
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            emit_tokens,
            emit_ast,
            emit_asm,
            asm_only,
        } => {
            let source = read_source(&input)?;

            println!("Compiling {}...", input.display());

            let tokens = lexer::tokenize(&source)
                .map_err(|err| report(&input, &source, err.span(), &err))?;
            if emit_tokens {
                println!("\n=== Tokens ===");
                print_tokens(&tokens, &source);
            }

            let arena = NodeArena::new();
            let program = parser::parse(tokens, &source, &arena)
                .map_err(|err| report(&input, &source, err.span(), &err))?;
            if emit_ast {
                println!("\n=== AST ===");
                println!("{:#?}", program);
            }

            let asm = codegen::generate(&program)
                .map_err(|err| report(&input, &source, err.span(), &err))?;
            if emit_asm {
                println!("\n=== Assembly ===");
                print!("{}", asm);
            }

            let out_path = output.unwrap_or_else(|| input.with_extension(""));
            let asm_path = out_path.with_extension("asm");
            if out_path == input || asm_path == input {
                return Err(miette::miette!(
                    "output {} would overwrite the input file",
                    input.display()
                ));
            }

            fs::write(&asm_path, &asm)
                .map_err(|e| miette::miette!("Failed to write {}: {}", asm_path.display(), e))?;

            if asm_only {
                println!("Wrote {}", asm_path.display());
                return Ok(());
            }

            assemble::assemble_and_link(&asm_path, &out_path)
                .map_err(|e| miette::miette!("{}", e))?;

            println!("Successfully compiled to: {}", out_path.display());
            Ok(())
        }

        Commands::Check { input } => {
            let source = read_source(&input)?;

            println!("Checking {}...", input.display());

            let tokens = lexer::tokenize(&source)
                .map_err(|err| report(&input, &source, err.span(), &err))?;
            let token_count = tokens.len();

            let arena = NodeArena::new();
            let program = parser::parse(tokens, &source, &arena)
                .map_err(|err| report(&input, &source, err.span(), &err))?;
            codegen::generate(&program)
                .map_err(|err| report(&input, &source, err.span(), &err))?;

            println!("No errors found! ({} tokens)", token_count);
            Ok(())
        }

        Commands::Tokenize { input } => {
            let source = read_source(&input)?;

            let tokens = lexer::tokenize(&source)
                .map_err(|err| report(&input, &source, err.span(), &err))?;
            print_tokens(&tokens, &source);

            Ok(())
        }

        Commands::Parse { input } => {
            let source = read_source(&input)?;

            let tokens = lexer::tokenize(&source)
                .map_err(|err| report(&input, &source, err.span(), &err))?;
            let arena = NodeArena::new();
            let program = parser::parse(tokens, &source, &arena)
                .map_err(|err| report(&input, &source, err.span(), &err))?;

            println!("{:#?}", program);

            Ok(())
        }
    }
}

fn read_source(path: &Path) -> miette::Result<String> {
    fs::read_to_string(path).map_err(|e| miette::miette!("Failed to read file: {}", e))
}

/// Render a stage error as `path:line:column: message`.
fn report(path: &Path, source: &str, span: Span, err: &dyn std::error::Error) -> miette::Report {
    let position = Position::locate(source, span.start);
    miette::miette!("{}:{}: {}", path.display(), position, err)
}

fn print_tokens(tokens: &[Token], source: &str) {
    for token in tokens {
        println!(
            "{:>4}..{:<4} {:20} {:?}",
            token.span.start,
            token.span.end,
            format!("{:?}", token.kind),
            token.text(source)
        );
    }
}
