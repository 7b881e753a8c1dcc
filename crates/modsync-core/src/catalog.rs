//! Dependency catalog.
//!
//! Maps a module to the modules it directly depends on. The resolver only
//! ever asks one question of it, so a catalog can be a static table, a
//! config file section, or something fed from a live registry.

use std::collections::BTreeMap;

use modsync_schema::ModuleName;
use serde::{Deserialize, Serialize};

/// Lookup of direct dependencies by module name.
pub trait DependencyCatalog: Send + Sync {
    /// Direct dependencies of `name`, in declaration order.
    ///
    /// Modules the catalog does not know about have no dependencies.
    fn dependencies_of(&self, name: &ModuleName) -> Vec<ModuleName>;
}

impl<T: DependencyCatalog + ?Sized> DependencyCatalog for std::sync::Arc<T> {
    fn dependencies_of(&self, name: &ModuleName) -> Vec<ModuleName> {
        (**self).dependencies_of(name)
    }
}

impl<T: DependencyCatalog + ?Sized> DependencyCatalog for &T {
    fn dependencies_of(&self, name: &ModuleName) -> Vec<ModuleName> {
        (**self).dependencies_of(name)
    }
}

/// An in-memory dependency table.
///
/// Deserializes from a plain map, which is how the `[catalog]` section of the
/// config file is written:
///
/// ```toml
/// [catalog]
/// sale = ["base", "product"]
/// product = ["base"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    deps: BTreeMap<ModuleName, Vec<ModuleName>>,
}

impl StaticCatalog {
    /// An empty catalog: every module is a leaf.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and small fixed tables.
    pub fn with(mut self, name: &str, deps: &[&str]) -> Self {
        self.insert(name.into(), deps.iter().map(|d| ModuleName::from(*d)).collect());
        self
    }

    /// Set the direct dependencies of `name`, replacing any previous entry.
    pub fn insert(&mut self, name: ModuleName, deps: Vec<ModuleName>) {
        self.deps.insert(name, deps);
    }

    /// Direct dependencies of `name`, if the catalog has an entry for it.
    pub fn get(&self, name: &str) -> Option<&[ModuleName]> {
        self.deps.get(name).map(Vec::as_slice)
    }

    /// Number of modules with an entry.
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    /// Returns `true` if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }
}

impl DependencyCatalog for StaticCatalog {
    fn dependencies_of(&self, name: &ModuleName) -> Vec<ModuleName> {
        self.deps.get(name).cloned().unwrap_or_default()
    }
}
