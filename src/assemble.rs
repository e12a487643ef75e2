//! Assembler and linker invocation
//!
//! The generator produces NASM source text; turning that into a runnable
//! binary is delegated to the system `nasm` and `ld`. Both run as plain
//! subprocesses with captured stderr.

use std::fs;
use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// Errors from driving the external toolchain
#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed:\n{stderr}")]
    Failed { tool: &'static str, stderr: String },
}

/// Assemble `asm_path` and link the result into `output_path`.
///
/// The intermediate object file lives next to the output and is removed
/// once linking succeeds.
pub fn assemble_and_link(asm_path: &Path, output_path: &Path) -> Result<(), AssembleError> {
    let object_path = output_path.with_extension("o");

    run(
        "nasm",
        Command::new("nasm")
            .arg("-felf64")
            .arg(asm_path)
            .arg("-o")
            .arg(&object_path),
    )?;
    run(
        "ld",
        Command::new("ld").arg("-o").arg(output_path).arg(&object_path),
    )?;

    let _ = fs::remove_file(&object_path);
    Ok(())
}

fn run(tool: &'static str, command: &mut Command) -> Result<(), AssembleError> {
    let output = command
        .output()
        .map_err(|source| AssembleError::Spawn { tool, source })?;
    if !output.status.success() {
        return Err(AssembleError::Failed {
            tool,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_reports_spawn_error() {
        let err = run(
            "nasm",
            Command::new("/nonexistent/lumen-toolchain/nasm").arg("--version"),
        )
        .unwrap_err();
        match err {
            AssembleError::Spawn { tool, .. } => assert_eq!(tool, "nasm"),
            other => panic!("expected spawn error, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_tool_message_carries_stderr() {
        let err = AssembleError::Failed {
            tool: "ld",
            stderr: "undefined reference".to_string(),
        };
        assert_eq!(err.to_string(), "ld failed:\nundefined reference");
    }
}
