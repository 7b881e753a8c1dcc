//! In-memory registry.
//!
//! Behaves like a real registry (same install rules as
//! [`FileRegistry`](super::FileRegistry)) and can be scripted to refuse
//! installs, drop connections, or fail listings. It also records every call
//! so tests can assert on what the reconciler actually did.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use modsync_schema::{InstallResponse, ModuleName, ModuleRecord, ModuleState};
use tokio_util::sync::CancellationToken;

use super::{Registry, RegistryError, apply_install};
use crate::catalog::{DependencyCatalog, StaticCatalog};

/// A registry that lives entirely in memory.
#[derive(Default)]
pub struct MemoryRegistry {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    modules: BTreeMap<ModuleName, ModuleState>,
    dependencies: Option<StaticCatalog>,
    refusals: HashMap<ModuleName, String>,
    transport_faults: HashMap<ModuleName, String>,
    listing_fault: Option<ListingFault>,
    cancel_after: Option<(ModuleName, CancellationToken)>,
    install_calls: Vec<ModuleName>,
    list_calls: usize,
}

struct ListingFault {
    after: usize,
    reason: String,
}

impl fmt::Debug for MemoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryRegistry")
            .field("modules", &inner.modules)
            .field("install_calls", &inner.install_calls)
            .finish_non_exhaustive()
    }
}

impl MemoryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a module in the given state.
    pub fn with_module(self, name: &str, state: ModuleState) -> Self {
        self.lock().modules.insert(name.into(), state);
        self
    }

    /// Refuse installs whose immediate dependencies are not installed.
    pub fn with_dependencies(self, catalog: StaticCatalog) -> Self {
        self.lock().dependencies = Some(catalog);
        self
    }

    /// Make installs of `name` come back with `success == false`.
    pub fn refuse_install(self, name: &str, reason: &str) -> Self {
        self.lock().refusals.insert(name.into(), reason.to_string());
        self
    }

    /// Make installs of `name` fail with a transport error.
    pub fn fail_transport(self, name: &str, reason: &str) -> Self {
        self.lock()
            .transport_faults
            .insert(name.into(), reason.to_string());
        self
    }

    /// Make every listing fail.
    pub fn fail_listing(self, reason: &str) -> Self {
        self.fail_listing_after(0, reason)
    }

    /// Let the first `calls` listings succeed, then fail every later one.
    pub fn fail_listing_after(self, calls: usize, reason: &str) -> Self {
        self.lock().listing_fault = Some(ListingFault {
            after: calls,
            reason: reason.to_string(),
        });
        self
    }

    /// Cancel `token` once the install call for `name` has completed.
    pub fn cancel_after_install(self, name: &str, token: CancellationToken) -> Self {
        self.lock().cancel_after = Some((name.into(), token));
        self
    }

    /// Every module an install was requested for, in call order.
    pub fn install_calls(&self) -> Vec<ModuleName> {
        self.lock().install_calls.clone()
    }

    /// Number of listing calls received.
    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    /// Current state of `name`.
    pub fn state_of(&self, name: &str) -> Option<ModuleState> {
        self.lock().modules.get(name).copied()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn list_modules(&self) -> Result<Vec<ModuleRecord>, RegistryError> {
        let mut inner = self.lock();
        inner.list_calls += 1;

        if let Some(fault) = &inner.listing_fault
            && inner.list_calls > fault.after
        {
            return Err(RegistryError::Transport(fault.reason.clone()));
        }

        Ok(inner
            .modules
            .iter()
            .map(|(name, state)| ModuleRecord::new(name.clone(), *state))
            .collect())
    }

    async fn install_module(&self, name: &ModuleName) -> Result<InstallResponse, RegistryError> {
        let mut inner = self.lock();
        inner.install_calls.push(name.clone());

        let outcome = if let Some(reason) = inner.transport_faults.get(name) {
            Err(RegistryError::Transport(reason.clone()))
        } else if let Some(reason) = inner.refusals.get(name) {
            Ok(InstallResponse::refused(format!("cannot install {name}"), reason.clone()))
        } else {
            let Inner {
                modules,
                dependencies,
                ..
            } = &mut *inner;
            apply_install(
                modules,
                dependencies.as_ref().map(|c| c as &dyn DependencyCatalog),
                name,
            )
        };

        if let Some((trigger, token)) = &inner.cancel_after
            && trigger == name
        {
            token.cancel();
        }

        outcome
    }
}
