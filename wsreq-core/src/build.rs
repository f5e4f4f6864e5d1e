//! # Build Stage
//!
//! Compiles every generated source file of a workspace as one unit.
//!
//! The stage itself is toolchain agnostic: it scans the source directory, hands the file list
//! to a [`Toolchain`] and turns the outcome into either a [`BuildOutput`] (the artifacts this run
//! produced) or a [`CompileError`] carrying every diagnostic verbatim.
//!
//! The include paths are fixed when the stage is constructed. Generated code may only import
//! definitions that are visible through them.
pub mod protoc;

pub use protoc::Protoc;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source encoding announced to toolchains.
pub const SOURCE_ENCODING: &str = "UTF-8";

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Compilation failed:\n{}", render(.diagnostics))]
    Failed { diagnostics: Vec<Diagnostic> },
    #[error("Failed to run the toolchain: '{0}'")]
    Toolchain(#[source] io::Error),
    #[error("Failed to scan sources in '{}': '{source}'", .dir.display())]
    Scan {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One message reported by the toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Source file the message points at, when the toolchain reported one.
    pub file: Option<PathBuf>,
    /// The message exactly as the toolchain printed it.
    pub text: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A single compilation unit.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub sources: &'a [PathBuf],
    /// Directory the sources were scanned from.
    pub source_root: &'a Path,
    pub output_dir: &'a Path,
    pub include_paths: &'a [PathBuf],
    pub encoding: &'static str,
}

/// What the toolchain reported for a compilation unit.
#[derive(Debug, Clone, Default)]
pub struct CompileOutcome {
    pub success: bool,
    /// Files written to the output directory by this run.
    pub artifacts: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// External compiler turning generated sources into loadable artifacts.
pub trait Toolchain: Send + Sync {
    /// Extension (without the dot) of the files this toolchain compiles.
    fn source_extension(&self) -> &str;

    /// Package-level marker files that live next to sources but must not be compiled.
    fn is_marker(&self, _file_name: &str) -> bool {
        false
    }

    /// Compiles `request`. An `Err` means the toolchain could not be run at all.
    fn compile(&self, request: CompileRequest<'_>) -> io::Result<CompileOutcome>;
}

/// Artifacts produced by one successful build run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub artifacts: Vec<PathBuf>,
}

pub struct BuildStage {
    toolchain: Box<dyn Toolchain>,
    include_paths: Vec<PathBuf>,
}

impl BuildStage {
    pub fn new(toolchain: Box<dyn Toolchain>, include_paths: Vec<PathBuf>) -> Self {
        Self {
            toolchain,
            include_paths,
        }
    }

    /// Compiles every source under `source_dir` into `binary_dir`.
    ///
    /// An empty source set is a successful no-op. Binaries left behind by a failed run are
    /// not removed.
    pub fn compile(
        &self,
        source_dir: &Path,
        binary_dir: &Path,
    ) -> Result<BuildOutput, CompileError> {
        let sources = self.scan(source_dir)?;

        if sources.is_empty() {
            tracing::debug!(source_dir = %source_dir.display(), "no sources to compile");
            return Ok(BuildOutput::default());
        }

        tracing::debug!(
            count = sources.len(),
            output_dir = %binary_dir.display(),
            include_paths = ?self.include_paths,
            "compiling generated sources"
        );

        let outcome = self
            .toolchain
            .compile(CompileRequest {
                sources: &sources,
                source_root: source_dir,
                output_dir: binary_dir,
                include_paths: &self.include_paths,
                encoding: SOURCE_ENCODING,
            })
            .map_err(CompileError::Toolchain)?;

        let has_errors = outcome
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error);

        if !outcome.success || has_errors {
            return Err(CompileError::Failed {
                diagnostics: outcome.diagnostics,
            });
        }

        for warning in &outcome.diagnostics {
            tracing::warn!(%warning, "toolchain warning");
        }

        Ok(BuildOutput {
            artifacts: outcome.artifacts,
        })
    }

    /// Recursively lists the compilable sources under `dir`, sorted by path.
    fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>, CompileError> {
        let extension = self.toolchain.source_extension();
        let mut sources = Vec::new();

        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(|source| CompileError::Scan {
                dir: dir.to_path_buf(),
                source,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let matches_extension = path.extension().is_some_and(|ext| ext == extension);
            let is_marker = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| self.toolchain.is_marker(name));

            if matches_extension && !is_marker {
                sources.push(path.to_path_buf());
            }
        }

        sources.sort();
        Ok(sources)
    }
}
