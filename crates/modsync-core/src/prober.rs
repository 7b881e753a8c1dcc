//! State prober: one registry listing, split into installed and available.

use modsync_schema::RegistrySnapshot;

use crate::error::ProbeError;
use crate::registry::Registry;

/// Query the registry once and partition the listing.
///
/// `installed` holds modules whose state is installed; `available` holds
/// every module the registry returned, installed ones included. No retries
/// are attempted here.
///
/// # Errors
///
/// Returns [`ProbeError`] if the registry cannot be listed. A partial
/// snapshot is never returned.
pub async fn probe<R: Registry + ?Sized>(registry: &R) -> Result<RegistrySnapshot, ProbeError> {
    let records = registry.list_modules().await?;

    let mut snapshot = RegistrySnapshot::default();
    for record in records {
        if record.state.is_installed() {
            snapshot.installed.insert(record.name.clone());
        }
        snapshot.available.insert(record.name);
    }

    tracing::debug!(
        installed = snapshot.installed.len(),
        available = snapshot.available.len(),
        "Probed registry state"
    );

    Ok(snapshot)
}
