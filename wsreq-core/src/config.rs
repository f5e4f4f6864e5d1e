//! # Client Configuration
//!
//! Everything the pipeline needs besides the descriptor address. The configuration is plain
//! data (serializable to JSON) so front-ends can persist it; every field has a default.
use crate::build::protoc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sub-path appended to the system temp directory for the default workspace root.
pub const DEFAULT_WORKSPACE_SUBDIR: &str = "org/hsweb/request/ws";

/// Program used to turn a descriptor into `.proto` sources when none is configured.
pub const DEFAULT_GENERATOR_PROGRAM: &str = "wsdl2proto";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Directory under which per-endpoint workspaces are created.
    pub workspace_root: PathBuf,
    /// Include directories handed to the toolchain on every build.
    pub include_paths: Vec<PathBuf>,
    /// Path of the `protoc` executable.
    pub protoc: PathBuf,
    pub generator: GeneratorConfig,
    /// Address the proxies are bound to. Defaults to the descriptor address.
    pub service_address: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub program: PathBuf,
    /// Extra arguments placed before the generator's own `-client -d` arguments.
    pub args: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir().join(DEFAULT_WORKSPACE_SUBDIR),
            include_paths: Vec::new(),
            protoc: protoc::default_program(),
            generator: GeneratorConfig::default(),
            service_address: None,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_GENERATOR_PROGRAM),
            args: Vec::new(),
        }
    }
}
