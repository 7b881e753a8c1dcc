//! The reconciliation pipeline.
//!
//! [`Reconciler`] owns nothing but its two collaborators and a reporter. Each
//! call runs the phases strictly in order and hands back a complete report,
//! or a fatal error before anything observable went wrong.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use modsync_schema::{
    InstallationOrder, ModuleName, Plan, ReconciliationReport, RegistrySnapshot, ValidationResult,
};
use tokio_util::sync::CancellationToken;

use crate::catalog::DependencyCatalog;
use crate::delta::compute_delta;
use crate::error::ReconcileError;
use crate::installer::install_all;
use crate::prober::probe;
use crate::registry::Registry;
use crate::reporter::{NullReporter, Reporter};
use crate::resolver::resolve;
use crate::validator::validate;

/// Pipeline phase of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Reading installed and available modules.
    Probing,
    /// Partitioning the request against the snapshot.
    Diffing,
    /// Ordering the modules to install.
    Resolving,
    /// Installing modules one by one.
    Installing,
    /// Re-probing to confirm the requested modules are installed.
    Validating,
    /// The run finished and produced a report.
    Done,
    /// The run aborted on a fatal error.
    Failed,
}

impl Phase {
    /// Lowercase name, as used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Probing => "probing",
            Self::Diffing => "diffing",
            Self::Resolving => "resolving",
            Self::Installing => "installing",
            Self::Validating => "validating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives a registry toward a requested set of installed modules.
pub struct Reconciler<R, C> {
    registry: R,
    catalog: C,
    reporter: Arc<dyn Reporter>,
}

impl<R: fmt::Debug, C: fmt::Debug> fmt::Debug for Reconciler<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("registry", &self.registry)
            .field("catalog", &self.catalog)
            .field("reporter", &"<dyn Reporter>")
            .finish()
    }
}

impl<R: Registry, C: DependencyCatalog> Reconciler<R, C> {
    /// A reconciler that reports nothing.
    pub fn new(registry: R, catalog: C) -> Self {
        Self {
            registry,
            catalog,
            reporter: Arc::new(NullReporter),
        }
    }

    /// Send progress events to `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// The registry this reconciler drives.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// The dependency catalog used for ordering.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Installed and available modules, straight from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Probe`] if the registry cannot be listed.
    pub async fn status(&self) -> Result<RegistrySnapshot, ReconcileError> {
        Ok(probe(&self.registry).await?)
    }

    /// Work out what a reconciliation would do, without installing anything.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] if the registry cannot be probed or a
    /// dependency cycle is reachable from the modules to install.
    pub async fn plan<I, S>(&self, requested: I, force_reinstall: bool) -> Result<Plan, ReconcileError>
    where
        I: IntoIterator<Item = S>,
        S: Into<ModuleName>,
    {
        let plan = self.prepare(requested, force_reinstall).await?;
        self.enter(Phase::Done);
        Ok(plan)
    }

    /// Reconcile the registry with `requested`.
    ///
    /// Equivalent to [`reconcile_with_cancel`](Self::reconcile_with_cancel)
    /// with a token that is never cancelled.
    ///
    /// # Errors
    ///
    /// See [`reconcile_with_cancel`](Self::reconcile_with_cancel).
    pub async fn reconcile<I, S>(
        &self,
        requested: I,
        force_reinstall: bool,
    ) -> Result<ReconciliationReport, ReconcileError>
    where
        I: IntoIterator<Item = S>,
        S: Into<ModuleName>,
    {
        self.reconcile_with_cancel(requested, force_reinstall, &CancellationToken::new())
            .await
    }

    /// Reconcile the registry with `requested`, stopping early if `cancel`
    /// fires.
    ///
    /// Installs happen one at a time in dependency order. Requested modules
    /// that are already installed are left alone unless `force_reinstall` is
    /// set. Per-module failures and cancellation never abort the run; they
    /// are recorded in the report, whose [`outcome`](ReconciliationReport::outcome)
    /// tells full success from partial.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Probe`] if the registry cannot be listed
    /// before installing and [`ReconcileError::CyclicDependency`] if the
    /// modules to install depend on each other in a loop. In both cases no
    /// install call has been made. If the registry cannot be listed after
    /// installing, the report is still returned with an unverified
    /// [`ValidationResult`] and every requested module counted as missing.
    pub async fn reconcile_with_cancel<I, S>(
        &self,
        requested: I,
        force_reinstall: bool,
        cancel: &CancellationToken,
    ) -> Result<ReconciliationReport, ReconcileError>
    where
        I: IntoIterator<Item = S>,
        S: Into<ModuleName>,
    {
        let Plan { delta, order } = self.prepare(requested, force_reinstall).await?;

        let results = if order.is_empty() {
            tracing::info!(
                already_installed = delta.already_installed.len(),
                "Nothing to install"
            );
            Vec::new()
        } else {
            self.enter(Phase::Installing);
            let reinstall = if force_reinstall {
                delta.to_install.clone()
            } else {
                BTreeSet::new()
            };
            install_all(&order, &self.registry, &reinstall, cancel, self.reporter.as_ref()).await
        };

        self.enter(Phase::Validating);
        let validation = match validate(&delta.requested, &self.registry).await {
            Ok(validation) => validation,
            Err(e) => {
                tracing::warn!(error = %e, "Could not validate installed modules");
                self.reporter
                    .warning(&format!("Could not validate installed modules: {e}"));
                ValidationResult::unverified(&delta.requested, e.to_string())
            }
        };

        let report = ReconciliationReport {
            delta,
            order,
            results,
            validation,
        };

        tracing::info!(
            installed = report.results.iter().filter(|r| r.succeeded).count(),
            failed = report.failed().len(),
            all_satisfied = report.validation.all_satisfied,
            "Reconciliation finished"
        );
        self.enter(Phase::Done);

        Ok(report)
    }

    /// Probe, diff and (when there is anything to install) resolve.
    async fn prepare<I, S>(&self, requested: I, force_reinstall: bool) -> Result<Plan, ReconcileError>
    where
        I: IntoIterator<Item = S>,
        S: Into<ModuleName>,
    {
        self.enter(Phase::Probing);
        let snapshot = probe(&self.registry).await.map_err(|e| self.fail(e))?;

        self.enter(Phase::Diffing);
        let delta = compute_delta(
            requested,
            &snapshot.installed,
            &snapshot.available,
            force_reinstall,
        );

        for module in &delta.unavailable {
            tracing::warn!(module = %module, "Requested module is not known to the registry");
            self.reporter
                .warning(&format!("Module '{module}' is not available in the registry"));
        }

        let order = if delta.to_install.is_empty() {
            InstallationOrder::default()
        } else {
            self.enter(Phase::Resolving);
            resolve(&delta.to_install, &snapshot, &self.catalog).map_err(|e| self.fail(e))?
        };

        tracing::debug!(
            requested = delta.requested.len(),
            to_install = delta.to_install.len(),
            order = order.len(),
            "Planned reconciliation"
        );

        let plan = Plan { delta, order };
        self.reporter.planned(&plan);
        Ok(plan)
    }

    fn enter(&self, phase: Phase) {
        tracing::debug!(phase = %phase, "Entering phase");
        self.reporter.phase(phase);
    }

    fn fail(&self, err: impl Into<ReconcileError>) -> ReconcileError {
        let err = err.into();
        tracing::error!(error = %err, "Reconciliation aborted");
        self.enter(Phase::Failed);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::registry::MemoryRegistry;
    use modsync_schema::ModuleState;
    use std::sync::Mutex;

    #[derive(Default)]
    struct PhaseLog(Mutex<Vec<Phase>>);

    impl PhaseLog {
        fn phases(&self) -> Vec<Phase> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Reporter for PhaseLog {
        fn phase(&self, phase: Phase) {
            self.0.lock().unwrap().push(phase);
        }
        fn planned(&self, _: &Plan) {}
        fn installing(&self, _: &ModuleName, _: usize, _: usize) {}
        fn done(&self, _: &ModuleName, _: &str) {}
        fn failed(&self, _: &ModuleName, _: &str) {}
        fn warning(&self, _: &str) {}
    }

    fn sale_registry() -> MemoryRegistry {
        MemoryRegistry::new()
            .with_module("base", ModuleState::Installed)
            .with_module("product", ModuleState::Uninstalled)
            .with_module("sale", ModuleState::Uninstalled)
    }

    fn sale_catalog() -> StaticCatalog {
        StaticCatalog::new()
            .with("sale", &["base", "product"])
            .with("product", &["base"])
            .with("base", &[])
    }

    #[tokio::test]
    async fn test_phases_in_order() {
        let log = Arc::new(PhaseLog::default());
        let reconciler = Reconciler::new(sale_registry(), sale_catalog()).with_reporter(log.clone());

        reconciler.reconcile(["sale"], false).await.unwrap();

        assert_eq!(
            log.phases(),
            vec![
                Phase::Probing,
                Phase::Diffing,
                Phase::Resolving,
                Phase::Installing,
                Phase::Validating,
                Phase::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_to_install_skips_resolve_and_install() {
        let log = Arc::new(PhaseLog::default());
        let reconciler = Reconciler::new(sale_registry(), sale_catalog()).with_reporter(log.clone());

        let report = reconciler.reconcile(["base"], false).await.unwrap();

        assert!(report.results.is_empty());
        assert!(report.validation.all_satisfied);
        assert_eq!(
            log.phases(),
            vec![Phase::Probing, Phase::Diffing, Phase::Validating, Phase::Done]
        );
    }

    #[tokio::test]
    async fn test_cycle_enters_failed_phase() {
        let log = Arc::new(PhaseLog::default());
        let registry = MemoryRegistry::new()
            .with_module("a", ModuleState::Uninstalled)
            .with_module("b", ModuleState::Uninstalled);
        let catalog = StaticCatalog::new().with("a", &["b"]).with("b", &["a"]);
        let reconciler = Reconciler::new(registry, catalog).with_reporter(log.clone());

        let err = reconciler.reconcile(["a", "b"], false).await.unwrap_err();

        assert!(matches!(err, ReconcileError::CyclicDependency(_)));
        assert_eq!(log.phases().last(), Some(&Phase::Failed));
        assert!(reconciler.registry().install_calls().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_registry_after_install_still_reaches_done() {
        let log = Arc::new(PhaseLog::default());
        let registry = sale_registry().fail_listing_after(3, "registry went away");
        let reconciler = Reconciler::new(registry, sale_catalog()).with_reporter(log.clone());

        let report = reconciler.reconcile(["sale"], false).await.unwrap();

        assert!(report.validation.is_unverified());
        assert!(!report.outcome().is_success());
        assert_eq!(log.phases().last(), Some(&Phase::Done));
        assert!(!log.phases().contains(&Phase::Failed));
    }

    #[tokio::test]
    async fn test_plan_does_not_install() {
        let reconciler = Reconciler::new(sale_registry(), sale_catalog());

        let plan = reconciler.plan(["sale"], false).await.unwrap();

        assert_eq!(plan.order.as_slice(), ["product", "sale"].map(ModuleName::from));
        assert!(reconciler.registry().install_calls().is_empty());
        assert_eq!(reconciler.registry().state_of("sale"), Some(ModuleState::Uninstalled));
    }

    #[tokio::test]
    async fn test_status_returns_snapshot() {
        let reconciler = Reconciler::new(sale_registry(), StaticCatalog::new());

        let snapshot = reconciler.status().await.unwrap();

        assert!(snapshot.is_installed("base"));
        assert!(!snapshot.is_installed("sale"));
        assert_eq!(snapshot.available.len(), 3);
    }

    #[tokio::test]
    async fn test_force_reinstalls_installed_module() {
        let reconciler = Reconciler::new(sale_registry(), sale_catalog());

        let report = reconciler.reconcile(["base"], true).await.unwrap();

        assert!(report.delta.already_installed.is_empty());
        assert_eq!(reconciler.registry().install_calls(), vec!["base"]);
        assert!(report.outcome().is_success());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Resolving.to_string(), "resolving");
        assert_eq!(Phase::Failed.as_str(), "failed");
    }
}
