//! # Protoc Toolchain
//!
//! Compiles `.proto` sources into a single binary `FileDescriptorSet` with the Protobuf
//! compiler. Imports are bundled (`--include_imports`) so the artifact is self-contained.
use super::{CompileOutcome, CompileRequest, Diagnostic, Severity, Toolchain};
use std::ffi::OsString;
use std::io;
use std::path::{self, PathBuf};
use std::process::Command;

/// Artifact written to the output directory on every run.
pub const DESCRIPTOR_SET_FILE: &str = "descriptors.bin";

#[derive(Debug, Clone)]
pub struct Protoc {
    program: PathBuf,
}

impl Protoc {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `true` when the configured executable can be launched.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .is_ok_and(|output| output.status.success())
    }
}

impl Default for Protoc {
    /// Uses `$PROTOC` when set, `protoc` from the `PATH` otherwise.
    fn default() -> Self {
        Self::new(default_program())
    }
}

/// The protoc executable named by `$PROTOC`, falling back to `protoc`.
pub fn default_program() -> PathBuf {
    program_or_default(std::env::var_os("PROTOC"))
}

fn program_or_default(configured: Option<OsString>) -> PathBuf {
    configured
        .filter(|program| !program.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("protoc"))
}

impl Toolchain for Protoc {
    fn source_extension(&self) -> &str {
        "proto"
    }

    fn compile(&self, request: CompileRequest<'_>) -> io::Result<CompileOutcome> {
        let descriptor_set = path::absolute(request.output_dir.join(DESCRIPTOR_SET_FILE))?;

        let mut command = Command::new(&self.program);
        command
            .arg("--include_imports")
            .arg(format!("--descriptor_set_out={}", descriptor_set.display()))
            .arg(format!(
                "--proto_path={}",
                path::absolute(request.source_root)?.display()
            ));

        for include in request.include_paths {
            command.arg(format!("--proto_path={}", path::absolute(include)?.display()));
        }

        for source in request.sources {
            command.arg(path::absolute(source)?);
        }

        tracing::debug!(?command, "running protoc");

        let output = command.output()?;
        let diagnostics = parse_diagnostics(&String::from_utf8_lossy(&output.stderr));
        let success = output.status.success();

        Ok(CompileOutcome {
            success,
            artifacts: if success {
                vec![descriptor_set]
            } else {
                Vec::new()
            },
            diagnostics,
        })
    }
}

/// Splits protoc's stderr into one diagnostic per non-empty line.
fn parse_diagnostics(stderr: &str) -> Vec<Diagnostic> {
    stderr
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|line| Diagnostic {
            severity: if line.contains("warning:") {
                Severity::Warning
            } else {
                Severity::Error
            },
            file: line
                .find(".proto:")
                .map(|end| PathBuf::from(&line[..end + ".proto".len()])),
            text: line.to_string(),
        })
        .collect()
}
