//! # Workspace
//!
//! Every endpoint gets its own directory pair under a shared root:
//!
//! ```text
//! {root}/{blake3(address)}/src/   generated sources
//! {root}/{blake3(address)}/bin/   compiled artifacts
//! ```
//!
//! The layout is a pure function of the descriptor address, so the same address always maps
//! to the same directories and two different addresses never share one. Directories are
//! created on demand and never removed; they act as a build cache across process runs.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SOURCE_DIR: &str = "src";
const BINARY_DIR: &str = "bin";

/// The per-endpoint source/binary directory pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    source_dir: PathBuf,
    binary_dir: PathBuf,
}

impl Workspace {
    /// Computes the workspace layout for `address` under `root` without touching the filesystem.
    pub fn locate(root: &Path, address: &str) -> Self {
        let root = root.join(endpoint_key(address));
        Self {
            source_dir: root.join(SOURCE_DIR),
            binary_dir: root.join(BINARY_DIR),
            root,
        }
    }

    /// Computes the workspace layout for `address` and creates both directories.
    ///
    /// Calling this again for the same address is a no-op that returns identical paths.
    pub fn prepare(root: &Path, address: &str) -> io::Result<Self> {
        let workspace = Self::locate(root, address);

        tracing::debug!(
            address,
            source_dir = %workspace.source_dir.display(),
            binary_dir = %workspace.binary_dir.display(),
            "preparing workspace"
        );

        fs::create_dir_all(&workspace.source_dir)?;
        fs::create_dir_all(&workspace.binary_dir)?;

        Ok(workspace)
    }

    /// The per-endpoint directory holding both `src/` and `bin/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn binary_dir(&self) -> &Path {
        &self.binary_dir
    }
}

/// One-way, hex encoded key identifying an endpoint on disk.
pub fn endpoint_key(address: &str) -> String {
    blake3::hash(address.as_bytes()).to_hex().to_string()
}
