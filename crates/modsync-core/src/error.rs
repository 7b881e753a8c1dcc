//! Fatal pipeline errors.
//!
//! Only two conditions abort a reconciliation: the registry cannot be
//! queried, or the dependency catalog has a cycle reachable from the modules
//! being installed. Both happen before any installation is attempted, so the
//! registry is never left half-driven by an aborted run. Per-module install
//! failures and a failed post-install check are not errors at this level;
//! they are recorded in the report.

use modsync_schema::ModuleName;
use thiserror::Error;

use crate::registry::RegistryError;

/// The registry could not be queried for module state.
#[derive(Error, Debug)]
#[error("Failed to query registry state: {source}")]
pub struct ProbeError {
    #[from]
    source: RegistryError,
}

impl ProbeError {
    /// The underlying registry failure.
    pub fn registry_error(&self) -> &RegistryError {
        &self.source
    }
}

/// A dependency cycle was found while ordering the modules to install.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Circular dependency detected involving module '{module}' ({})", format_chain(.chain))]
pub struct CyclicDependencyError {
    /// The module that was reached again while still being visited.
    pub module: ModuleName,
    /// The dependency path that closes the cycle, starting and ending at `module`.
    pub chain: Vec<ModuleName>,
}

fn format_chain(chain: &[ModuleName]) -> String {
    chain
        .iter()
        .map(ModuleName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Any error that aborts a reconciliation run.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The registry could not be queried.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// The catalog contains a cycle reachable from the install set.
    #[error(transparent)]
    CyclicDependency(#[from] CyclicDependencyError),
}
