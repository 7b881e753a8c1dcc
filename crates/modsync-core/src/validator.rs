//! Post-install validation against a fresh registry probe.

use std::collections::BTreeSet;

use modsync_schema::{ModuleCheck, ModuleName, ValidationResult};

use crate::error::ProbeError;
use crate::prober::probe;
use crate::registry::Registry;

/// Check that every requested module is now installed.
///
/// Always probes the registry again rather than trusting the install
/// results: a registry may report success for an install that did not stick,
/// or a module may have been installed by someone else in the meantime.
/// Modules are checked in name order. Nothing is re-attempted.
///
/// # Errors
///
/// Returns [`ProbeError`] if the fresh probe fails.
pub async fn validate<R: Registry + ?Sized>(
    requested: &BTreeSet<ModuleName>,
    registry: &R,
) -> Result<ValidationResult, ProbeError> {
    let snapshot = probe(registry).await?;

    let checked_modules: Vec<ModuleCheck> = requested
        .iter()
        .map(|module| ModuleCheck {
            module: module.clone(),
            installed: snapshot.is_installed(module),
        })
        .collect();

    let missing: Vec<ModuleName> = checked_modules
        .iter()
        .filter(|c| !c.installed)
        .map(|c| c.module.clone())
        .collect();

    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "Requested modules not installed after reconciliation");
    }

    Ok(ValidationResult {
        checked_modules,
        all_satisfied: missing.is_empty(),
        missing,
        error: None,
    })
}
