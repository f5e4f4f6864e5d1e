use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;
use wsreq_core::config::ClientConfig;

use crate::cli::Cli;

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Uses the platform config directory (e.g. `~/.config/wsreq/config.json`).
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("org", "wsreq", "wsreq")
            .context("Could not determine config directory")?;

        Ok(Self {
            config_path: proj_dirs.config_dir().join("config.json"),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// A missing file yields the defaults, an unreadable or invalid one is an error.
    pub fn load(&self) -> Result<ClientConfig> {
        if !self.config_path.exists() {
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read '{}'", self.config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in '{}'", self.config_path.display()))
    }
}

/// Loads the configuration file and applies the command-line overrides on top of it.
pub fn resolve(cli: &Cli) -> Result<ClientConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::at(path),
        None => ConfigManager::new()?,
    };

    let mut config = manager.load()?;
    apply_overrides(&mut config, cli);

    Ok(config)
}

fn apply_overrides(config: &mut ClientConfig, cli: &Cli) {
    if let Some(root) = &cli.workspace_root {
        config.workspace_root = root.clone();
    }
    config.include_paths.extend(cli.include_paths.iter().cloned());
    if let Some(protoc) = &cli.protoc {
        config.protoc = protoc.clone();
    }
    if let Some(generator) = &cli.generator {
        config.generator.program = generator.clone();
    }
    if !cli.generator_args.is_empty() {
        config.generator.args = cli.generator_args.clone();
    }
    if let Some(address) = &cli.service_address {
        config.service_address = Some(address.clone());
    }
}
