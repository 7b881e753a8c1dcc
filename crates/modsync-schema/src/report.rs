//! Reconciliation report types.
//!
//! A [`ReconciliationReport`] is assembled exactly once per run from the
//! outputs of each pipeline phase and handed back to the caller. Callers read
//! the overall verdict through [`ReconciliationReport::outcome`], which never
//! collapses to a bare boolean.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::ModuleName;

/// Error text recorded for modules skipped because the run was cancelled.
pub const CANCELLED: &str = "cancelled";

/// Message recorded when the pre-install re-check finds the module present.
pub const ALREADY_INSTALLED: &str = "already installed";

/// Installed and available module sets as seen by a single registry query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Modules whose state is installed.
    pub installed: BTreeSet<ModuleName>,
    /// Every module the registry knows about, installed ones included.
    pub available: BTreeSet<ModuleName>,
}

impl RegistrySnapshot {
    /// Returns `true` if `name` is installed in this snapshot.
    pub fn is_installed(&self, name: &str) -> bool {
        self.installed.contains(name)
    }

    /// Returns `true` if the registry knows about `name`.
    pub fn is_available(&self, name: &str) -> bool {
        self.available.contains(name)
    }
}

/// Partition of the requested modules against the registry state.
///
/// `already_installed`, `to_install` and `unavailable` are pairwise disjoint
/// and together cover `requested` exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationDelta {
    /// Deduplicated set of modules the caller asked for.
    pub requested: BTreeSet<ModuleName>,
    /// Requested modules that are already installed.
    pub already_installed: BTreeSet<ModuleName>,
    /// Requested modules that must be installed.
    pub to_install: BTreeSet<ModuleName>,
    /// Requested modules the registry does not know about.
    pub unavailable: BTreeSet<ModuleName>,
}

/// Modules in installation order, dependencies first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallationOrder(Vec<ModuleName>);

impl InstallationOrder {
    /// Wrap an already-ordered sequence.
    pub fn new(modules: Vec<ModuleName>) -> Self {
        Self(modules)
    }

    /// Number of modules in the order.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing needs installing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of `name` in the order, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|m| m.as_str() == name)
    }

    /// Returns `true` if `name` appears in the order.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterate over the modules in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ModuleName> {
        self.0.iter()
    }

    /// Borrow the order as a slice.
    pub fn as_slice(&self) -> &[ModuleName] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a InstallationOrder {
    type Item = &'a ModuleName;
    type IntoIter = std::slice::Iter<'a, ModuleName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of attempting to install one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationResult {
    /// The module this result belongs to.
    pub module: ModuleName,
    /// Whether the module ended the attempt installed.
    pub succeeded: bool,
    /// Human-readable status line.
    pub message: String,
    /// Failure cause, set whenever `succeeded` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallationResult {
    /// A successful installation.
    pub fn success(module: ModuleName, message: impl Into<String>) -> Self {
        Self {
            module,
            succeeded: true,
            message: message.into(),
            error: None,
        }
    }

    /// A failed installation.
    pub fn failure(module: ModuleName, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            module,
            succeeded: false,
            message: message.into(),
            error: Some(error.into()),
        }
    }

    /// A module that was never attempted because the run was cancelled.
    pub fn cancelled(module: ModuleName) -> Self {
        Self::failure(module, "skipped", CANCELLED)
    }

    /// Returns `true` if this module was skipped by cancellation.
    pub fn is_cancelled(&self) -> bool {
        !self.succeeded && self.error.as_deref() == Some(CANCELLED)
    }
}

/// Installation status of one requested module after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCheck {
    /// The requested module.
    pub module: ModuleName,
    /// Whether the fresh probe found it installed.
    pub installed: bool,
}

/// Ground truth about the requested modules, taken after installation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// One entry per requested module, in name order.
    pub checked_modules: Vec<ModuleCheck>,
    /// `true` iff every requested module is installed.
    pub all_satisfied: bool,
    /// Requested modules that are still not installed.
    pub missing: Vec<ModuleName>,
    /// Why the registry could not be checked, if it could not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    /// A result for a run whose post-install check could not be taken.
    ///
    /// Every requested module is reported missing: nothing is known to be
    /// installed until the registry says so.
    pub fn unverified<'a>(
        requested: impl IntoIterator<Item = &'a ModuleName>,
        error: impl Into<String>,
    ) -> Self {
        let missing: Vec<ModuleName> = requested.into_iter().cloned().collect();
        Self {
            checked_modules: missing
                .iter()
                .map(|module| ModuleCheck {
                    module: module.clone(),
                    installed: false,
                })
                .collect(),
            all_satisfied: false,
            missing,
            error: Some(error.into()),
        }
    }

    /// Returns `true` if the registry could not be checked.
    pub fn is_unverified(&self) -> bool {
        self.error.is_some()
    }
}

/// Read-only preview of a reconciliation: the delta and the order that would
/// be installed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Partition of the requested modules.
    pub delta: InstallationDelta,
    /// Resolved installation order, transitive dependencies included.
    pub order: InstallationOrder,
}

/// The complete output of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Partition of the requested modules.
    pub delta: InstallationDelta,
    /// Order the installer worked through.
    pub order: InstallationOrder,
    /// One entry per module in `order`.
    pub results: Vec<InstallationResult>,
    /// Post-install ground truth.
    pub validation: ValidationResult,
}

impl ReconciliationReport {
    /// Modules installed only because something requested depends on them.
    pub fn pulled_in(&self) -> Vec<ModuleName> {
        self.order
            .iter()
            .filter(|m| !self.delta.to_install.contains(*m))
            .cloned()
            .collect()
    }

    /// Modules whose installation attempt failed (cancellations excluded).
    pub fn failed(&self) -> Vec<ModuleName> {
        self.results
            .iter()
            .filter(|r| !r.succeeded && !r.is_cancelled())
            .map(|r| r.module.clone())
            .collect()
    }

    /// Overall verdict for this run.
    pub fn outcome(&self) -> Outcome {
        let all_succeeded = self.results.iter().all(|r| r.succeeded);
        if all_succeeded && self.validation.all_satisfied && self.delta.unavailable.is_empty() {
            return Outcome::Success;
        }

        Outcome::Partial(PartialOutcome {
            failed: self.failed(),
            cancelled: self
                .results
                .iter()
                .filter(|r| r.is_cancelled())
                .map(|r| r.module.clone())
                .collect(),
            missing: self.validation.missing.clone(),
            unavailable: self.delta.unavailable.iter().cloned().collect(),
        })
    }
}

/// Overall verdict of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Every install succeeded and every requested module is installed.
    Success,
    /// Something is still off; the details say what.
    Partial(PartialOutcome),
}

impl Outcome {
    /// Returns `true` for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// What kept a reconciliation from full success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialOutcome {
    /// Modules whose install attempt failed.
    pub failed: Vec<ModuleName>,
    /// Modules skipped because the run was cancelled.
    pub cancelled: Vec<ModuleName>,
    /// Requested modules still not installed after the run.
    pub missing: Vec<ModuleName>,
    /// Requested modules the registry does not know about.
    pub unavailable: Vec<ModuleName>,
}
