//! Sequential installer.
//!
//! Works through an [`InstallationOrder`] one module at a time. Every module
//! gets exactly one [`InstallationResult`]; a failure is recorded and the
//! loop moves on, since later modules that do not depend on the failed one
//! may still install. Installs are never run concurrently: the order is the
//! correctness invariant.

use std::collections::BTreeSet;

use modsync_schema::{ALREADY_INSTALLED, InstallationOrder, InstallationResult, ModuleName, ModuleState};
use tokio_util::sync::CancellationToken;

use crate::registry::{Registry, RegistryError};
use crate::reporter::Reporter;

/// Install every module in `order`, strictly in sequence.
///
/// Before each install the module's current state is re-read from the
/// registry; a module that is already installed is reported as succeeded
/// without an install call, unless it is listed in `reinstall`.
///
/// Cancellation is checked between modules. An install already in flight
/// runs to completion; every module after it is reported as cancelled.
pub async fn install_all<R: Registry + ?Sized>(
    order: &InstallationOrder,
    registry: &R,
    reinstall: &BTreeSet<ModuleName>,
    cancel: &CancellationToken,
    reporter: &dyn Reporter,
) -> Vec<InstallationResult> {
    let total = order.len();
    let mut results = Vec::with_capacity(total);

    for (i, module) in order.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!(module = %module, "Skipping install, reconciliation cancelled");
            reporter.failed(module, "cancelled");
            results.push(InstallationResult::cancelled(module.clone()));
            continue;
        }

        reporter.installing(module, i + 1, total);
        let result = install_one(module, registry, reinstall.contains(module)).await;

        if result.succeeded {
            tracing::info!(module = %module, message = %result.message, "Module installed");
            reporter.done(module, &result.message);
        } else {
            let reason = result.error.as_deref().unwrap_or(&result.message);
            tracing::warn!(module = %module, error = %reason, "Module installation failed");
            reporter.failed(module, reason);
        }

        results.push(result);
    }

    results
}

async fn install_one<R: Registry + ?Sized>(
    module: &ModuleName,
    registry: &R,
    force: bool,
) -> InstallationResult {
    if !force {
        match current_state(module, registry).await {
            Ok(Some(ModuleState::Installed)) => {
                tracing::debug!(module = %module, "Already installed, skipping");
                return InstallationResult::success(module.clone(), ALREADY_INSTALLED);
            }
            Ok(_) => {}
            Err(e) => {
                return InstallationResult::failure(
                    module.clone(),
                    "state re-check failed",
                    e.to_string(),
                );
            }
        }
    }

    match registry.install_module(module).await {
        Ok(resp) if resp.success => InstallationResult::success(module.clone(), resp.message),
        Ok(resp) => {
            let error = resp
                .error
                .unwrap_or_else(|| "registry reported failure".to_string());
            InstallationResult::failure(module.clone(), resp.message, error)
        }
        Err(e) => InstallationResult::failure(module.clone(), "install failed", e.to_string()),
    }
}

/// Current state of `module`, or `None` if the registry no longer lists it.
async fn current_state<R: Registry + ?Sized>(
    module: &ModuleName,
    registry: &R,
) -> Result<Option<ModuleState>, RegistryError> {
    let records = registry.list_modules().await?;
    Ok(records
        .into_iter()
        .find(|r| &r.name == module)
        .map(|r| r.state))
}
