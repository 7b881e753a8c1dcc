//! File-backed registry.
//!
//! Module state lives in a TOML file:
//!
//! ```toml
//! [modules]
//! base = "installed"
//! product = "uninstalled"
//! sale = "to install"
//! ```
//!
//! The file is read on every listing, so edits made by hand between runs are
//! picked up. Installs rewrite it atomically.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use modsync_schema::{InstallResponse, ModuleName, ModuleRecord, ModuleState};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use super::{Registry, RegistryError, apply_install};
use crate::catalog::{DependencyCatalog, StaticCatalog};

/// On-disk layout of the state file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    modules: BTreeMap<ModuleName, ModuleState>,
}

/// A registry whose state is a TOML file on disk.
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    dependencies: Option<StaticCatalog>,
    write_lock: Mutex<()>,
}

impl FileRegistry {
    /// Registry backed by the state file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dependencies: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Refuse installs whose immediate dependencies are not installed.
    pub fn with_dependencies(mut self, catalog: StaticCatalog) -> Self {
        self.dependencies = Some(catalog);
        self
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StateFile, RegistryError> {
        let content = fs::read_to_string(&self.path).await?;
        toml::from_str(&content)
            .map_err(|e| RegistryError::Parse(format!("{}: {e}", self.path.display())))
    }

    async fn save(&self, state: &StateFile) -> Result<(), RegistryError> {
        let content = toml::to_string_pretty(state)
            .map_err(|e| RegistryError::Parse(e.to_string()))?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("toml.tmp");
        fs::write(&temp_path, &content).await?;
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }
}

#[async_trait]
impl Registry for FileRegistry {
    async fn list_modules(&self) -> Result<Vec<ModuleRecord>, RegistryError> {
        let state = self.load().await?;
        Ok(state
            .modules
            .into_iter()
            .map(|(name, state)| ModuleRecord::new(name, state))
            .collect())
    }

    async fn install_module(&self, name: &ModuleName) -> Result<InstallResponse, RegistryError> {
        let _guard = self.write_lock.lock().await;

        let mut state = self.load().await?;
        let before = state.modules.get(name).copied();
        let resp = apply_install(
            &mut state.modules,
            self.dependencies.as_ref().map(|c| c as &dyn DependencyCatalog),
            name,
        )?;

        if state.modules.get(name).copied() != before {
            self.save(&state).await?;
            tracing::debug!(module = %name, path = %self.path.display(), "Wrote registry state");
        }

        Ok(resp)
    }
}
