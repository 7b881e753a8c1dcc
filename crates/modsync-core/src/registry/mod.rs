//! The registry seam.
//!
//! A registry is the external system that owns the authoritative module
//! state. The reconciler needs exactly two things from it: a full listing of
//! modules with their state, and a way to install one module. Everything else
//! about the transport (protocol, authentication, retries, timeouts) lives
//! behind this trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use modsync_schema::{InstallResponse, ModuleName, ModuleRecord, ModuleState};
use thiserror::Error;

use crate::catalog::DependencyCatalog;

pub mod file;
pub mod memory;

pub use file::FileRegistry;
pub use memory::MemoryRegistry;

/// Transport-level failure talking to a registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry could not be reached or did not answer.
    #[error("Registry transport failed: {0}")]
    Transport(String),

    /// Local I/O failure (file-backed registries).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The registry answered with data we could not interpret.
    #[error("Invalid registry data: {0}")]
    Parse(String),

    /// The registry does not know the module it was asked to install.
    #[error("Unknown module: {0}")]
    UnknownModule(ModuleName),
}

/// A module registry the reconciler can query and mutate.
///
/// Implementations must return every module they know about from
/// [`list_modules`](Self::list_modules). [`install_module`](Self::install_module)
/// installs exactly one module and is expected to refuse cleanly (an
/// `Ok` response with `success == false`) when an immediate dependency is not
/// installed yet.
#[async_trait]
pub trait Registry: Send + Sync {
    /// List every module with its current lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the registry cannot be reached or its
    /// answer cannot be read.
    async fn list_modules(&self) -> Result<Vec<ModuleRecord>, RegistryError>;

    /// Install a single module.
    ///
    /// A refusal is an `Ok` response with `success == false`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on transport failure, or if the registry
    /// does not know `name`.
    async fn install_module(&self, name: &ModuleName) -> Result<InstallResponse, RegistryError>;
}

#[async_trait]
impl<T: Registry + ?Sized> Registry for std::sync::Arc<T> {
    async fn list_modules(&self) -> Result<Vec<ModuleRecord>, RegistryError> {
        (**self).list_modules().await
    }

    async fn install_module(&self, name: &ModuleName) -> Result<InstallResponse, RegistryError> {
        (**self).install_module(name).await
    }
}

/// Apply an install request to a module state table.
///
/// Shared by the registries shipped with this crate so they agree on what a
/// registry does: unknown modules are an error, unavailable modules and
/// modules with an uninstalled immediate dependency are refused, anything
/// else becomes installed. Dependencies the table does not know are assumed
/// to be provided by the platform.
pub(crate) fn apply_install(
    modules: &mut BTreeMap<ModuleName, ModuleState>,
    dependencies: Option<&dyn DependencyCatalog>,
    name: &ModuleName,
) -> Result<InstallResponse, RegistryError> {
    let state = *modules
        .get(name)
        .ok_or_else(|| RegistryError::UnknownModule(name.clone()))?;

    match state {
        ModuleState::Installed => return Ok(InstallResponse::ok("already installed")),
        ModuleState::Unavailable => {
            return Ok(InstallResponse::refused(
                format!("cannot install {name}"),
                format!("module '{name}' is not installable"),
            ));
        }
        ModuleState::ToInstall | ModuleState::ToUpgrade | ModuleState::Uninstalled => {}
    }

    if let Some(catalog) = dependencies {
        let missing: Vec<String> = catalog
            .dependencies_of(name)
            .into_iter()
            .filter(|dep| modules.get(dep).is_some_and(|s| !s.is_installed()))
            .map(|dep| dep.to_string())
            .collect();

        if !missing.is_empty() {
            return Ok(InstallResponse::refused(
                format!("cannot install {name}"),
                format!("missing dependencies: {}", missing.join(", ")),
            ));
        }
    }

    modules.insert(name.clone(), ModuleState::Installed);
    Ok(InstallResponse::ok("installed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;

    fn table(entries: &[(&str, ModuleState)]) -> BTreeMap<ModuleName, ModuleState> {
        entries
            .iter()
            .map(|(n, s)| (ModuleName::from(*n), *s))
            .collect()
    }

    #[test]
    fn test_apply_install_marks_installed() {
        let mut modules = table(&[("base", ModuleState::Uninstalled)]);
        let resp = apply_install(&mut modules, None, &"base".into()).unwrap();
        assert!(resp.success);
        assert_eq!(modules["base"], ModuleState::Installed);
    }

    #[test]
    fn test_apply_install_refuses_missing_dependency() {
        let mut modules = table(&[
            ("base", ModuleState::Installed),
            ("product", ModuleState::Uninstalled),
            ("sale", ModuleState::Uninstalled),
        ]);
        let catalog = StaticCatalog::new().with("sale", &["base", "product"]);

        let resp = apply_install(&mut modules, Some(&catalog), &"sale".into()).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("missing dependencies: product"));
        assert_eq!(modules["sale"], ModuleState::Uninstalled);
    }

    #[test]
    fn test_apply_install_ignores_unknown_dependency() {
        let mut modules = table(&[("sale", ModuleState::Uninstalled)]);
        let catalog = StaticCatalog::new().with("sale", &["web"]);

        let resp = apply_install(&mut modules, Some(&catalog), &"sale".into()).unwrap();
        assert!(resp.success);
    }

    #[test]
    fn test_apply_install_unknown_module() {
        let mut modules = table(&[]);
        let err = apply_install(&mut modules, None, &"ghost".into()).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownModule(name) if name == "ghost"));
    }

    #[test]
    fn test_apply_install_refuses_unavailable() {
        let mut modules = table(&[("legacy", ModuleState::Unavailable)]);
        let resp = apply_install(&mut modules, None, &"legacy".into()).unwrap();
        assert!(!resp.success);
        assert_eq!(modules["legacy"], ModuleState::Unavailable);
    }
}
