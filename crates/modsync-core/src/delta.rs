//! Delta calculator: pure set algebra over requested, installed and available.

use std::collections::BTreeSet;

use modsync_schema::{InstallationDelta, ModuleName};

/// Partition `requested` against the registry state.
///
/// - `unavailable = requested - available`
/// - `already_installed = requested ∩ installed` (empty when `force_reinstall`)
/// - `to_install = (requested - installed) ∩ available`, or
///   `requested ∩ available` when `force_reinstall`
///
/// The input order of `requested` is irrelevant and duplicates collapse.
pub fn compute_delta<I, S>(
    requested: I,
    installed: &BTreeSet<ModuleName>,
    available: &BTreeSet<ModuleName>,
    force_reinstall: bool,
) -> InstallationDelta
where
    I: IntoIterator<Item = S>,
    S: Into<ModuleName>,
{
    let requested: BTreeSet<ModuleName> = requested.into_iter().map(Into::into).collect();

    let mut delta = InstallationDelta {
        requested,
        ..InstallationDelta::default()
    };

    for name in &delta.requested {
        if !available.contains(name) {
            delta.unavailable.insert(name.clone());
        } else if installed.contains(name) && !force_reinstall {
            delta.already_installed.insert(name.clone());
        } else {
            delta.to_install.insert(name.clone());
        }
    }

    delta
}
