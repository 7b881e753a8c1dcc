//! `modsync.toml` configuration.
//!
//! ```toml
//! [registry]
//! state_file = "registry.toml"
//! enforce_dependencies = true
//!
//! [catalog]
//! sale = ["base", "product"]
//! product = ["base"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

use crate::catalog::StaticCatalog;
use crate::registry::FileRegistry;

/// Failure loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid configuration.
    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where module state lives.
    pub registry: RegistryConfig,
    /// Direct dependencies of each module.
    #[serde(default)]
    pub catalog: StaticCatalog,
}

/// `[registry]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path of the registry state file.
    pub state_file: PathBuf,
    /// Have the registry refuse installs whose dependencies are missing.
    #[serde(default = "default_true")]
    pub enforce_dependencies: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// A relative `state_file` is taken relative to the directory holding the
    /// config file, not the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&content, base_dir).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration text, resolving relative paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if `content` is not valid configuration.
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        if config.registry.state_file.is_relative() {
            config.registry.state_file = base_dir.join(&config.registry.state_file);
        }
        Ok(config)
    }

    /// Open the file registry described by this configuration.
    pub fn open_registry(&self) -> FileRegistry {
        let registry = FileRegistry::new(&self.registry.state_file);
        if self.registry.enforce_dependencies {
            registry.with_dependencies(self.catalog.clone())
        } else {
            registry
        }
    }
}
