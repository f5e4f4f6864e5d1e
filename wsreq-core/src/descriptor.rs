//! # Descriptor Compiler
//!
//! Turns a descriptor address into generated `.proto` sources plus a model of what those
//! sources declare.
//!
//! The work is split in two steps so callers can tell them apart:
//!
//! 1. **Retrieval**: the document is fetched (`http(s)://`) or read (`file://`, plain paths)
//!    and stored in the workspace. Failing here means the descriptor is *unreachable*.
//! 2. **Generation**: an external [`Generator`] reads the stored document, writes sources into
//!    the workspace source directory and reports the declared interfaces and services.
//!    Failing here means the descriptor is *malformed*.
//!
//! The names reported by the generator become the keys of the type registry. Running several
//! generators against the same workspace is not supported: the last write wins.
use crate::{BoxError, workspace::Workspace};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File name of the retrieved descriptor inside the workspace root.
pub const DESCRIPTOR_FILE: &str = "descriptor.wsdl";

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Descriptor '{address}' is unreachable: '{source}'")]
    Unreachable {
        address: String,
        #[source]
        source: BoxError,
    },
    #[error("Descriptor '{address}' was rejected by the generator: '{source}'")]
    Malformed {
        address: String,
        #[source]
        source: GenerateError,
    },
    #[error("Generator failed on descriptor '{address}': '{source}'")]
    Generator {
        address: String,
        #[source]
        source: GenerateError,
    },
    #[error("Failed to store descriptor '{address}' in the workspace: '{source}'")]
    Store {
        address: String,
        #[source]
        source: io::Error,
    },
}

impl DescriptorError {
    /// `true` when the document could not be retrieved at all, as opposed to retrieved and
    /// then rejected.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, DescriptorError::Unreachable { .. })
    }
}

/// Errors reported by a [`Generator`].
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Failed to launch generator '{program}': '{source}'")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Generator exited with {status}: {stderr}")]
    Rejected { status: String, stderr: String },
    #[error("Generator reported an unreadable model: '{0}'")]
    InvalidModel(#[from] serde_json::Error),
    #[error(transparent)]
    Other(BoxError),
}

/// A remote interface declared by the descriptor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeclaredInterface {
    /// Short name used as the registry key (e.g. `WeatherPort`).
    pub name: String,
    /// Fully qualified name of the generated definition (e.g. `weather.WeatherPort`).
    pub full_name: String,
}

/// A service binding declared by the descriptor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeclaredService {
    pub name: String,
    pub full_name: String,
}

/// What a generator run declared, in the order the generator reported it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratedModel {
    #[serde(default)]
    pub interfaces: Vec<DeclaredInterface>,
    #[serde(default)]
    pub services: Vec<DeclaredService>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateMode {
    Client,
}

impl GenerateMode {
    fn as_flag(self) -> &'static str {
        match self {
            GenerateMode::Client => "-client",
        }
    }
}

/// Input of a single generator run.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub mode: GenerateMode,
    /// The original descriptor address, for generators resolving relative imports.
    pub address: &'a str,
    /// Local copy of the retrieved descriptor.
    pub document: &'a Path,
    /// Directory the sources must be written to.
    pub output_dir: &'a Path,
}

/// External descriptor-to-source generator.
pub trait Generator: Send + Sync {
    fn generate(&self, request: GenerateRequest<'_>) -> Result<GeneratedModel, GenerateError>;
}

/// Runs an external generator program.
///
/// The program is invoked as `{program} {args..} -client -d {output_dir} {document}` and must
/// print the [`GeneratedModel`] as JSON on stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, request: GenerateRequest<'_>) -> Result<GeneratedModel, GenerateError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(request.mode.as_flag())
            .arg("-d")
            .arg(request.output_dir)
            .arg(request.document);

        tracing::debug!(?command, "running descriptor generator");

        let output = command.output().map_err(|source| GenerateError::Launch {
            program: self.program.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(GenerateError::Rejected {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// Drives retrieval and generation for one endpoint.
pub struct DescriptorCompiler {
    generator: Box<dyn Generator>,
}

impl DescriptorCompiler {
    pub fn new(generator: Box<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Retrieves the descriptor at `address` and runs the generator into the workspace.
    pub fn generate(
        &self,
        address: &str,
        workspace: &Workspace,
    ) -> Result<GeneratedModel, DescriptorError> {
        let document = workspace.root().join(DESCRIPTOR_FILE);
        retrieve(address, &document)?;

        tracing::debug!(
            address,
            output_dir = %workspace.source_dir().display(),
            "generating sources from descriptor"
        );

        let request = GenerateRequest {
            mode: GenerateMode::Client,
            address,
            document: &document,
            output_dir: workspace.source_dir(),
        };

        self.generator
            .generate(request)
            .map_err(|source| match source {
                GenerateError::Rejected { .. } | GenerateError::Other(_) => {
                    DescriptorError::Malformed {
                        address: address.to_string(),
                        source,
                    }
                }
                GenerateError::Launch { .. } | GenerateError::InvalidModel(_) => {
                    DescriptorError::Generator {
                        address: address.to_string(),
                        source,
                    }
                }
            })
    }
}

/// Copies the document at `address` into `destination`.
fn retrieve(address: &str, destination: &Path) -> Result<(), DescriptorError> {
    let unreachable = |source: BoxError| DescriptorError::Unreachable {
        address: address.to_string(),
        source,
    };

    tracing::debug!(address, "retrieving descriptor");

    let bytes = if address.starts_with("http://") || address.starts_with("https://") {
        reqwest::blocking::get(address)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(|e| unreachable(e.into()))?
            .to_vec()
    } else {
        let path = address.strip_prefix("file://").unwrap_or(address);
        fs::read(path).map_err(|e| unreachable(e.into()))?
    };

    fs::write(destination, bytes).map_err(|source| DescriptorError::Store {
        address: address.to_string(),
        source,
    })
}
