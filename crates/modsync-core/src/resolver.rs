//! Dependency-first installation ordering.

use std::collections::{BTreeSet, HashSet};

use modsync_schema::{InstallationOrder, ModuleName, RegistrySnapshot};

use crate::catalog::DependencyCatalog;
use crate::error::CyclicDependencyError;

/// Resolves the modules to install into a dependency-first installation order.
///
/// Performs a depth-first traversal of the dependency graph with an explicit
/// stack, using `temporary` (on the current path) and `permanent` (fully
/// processed) marks. Reaching a module that is still marked temporary means
/// the path has looped back on itself.
///
/// A dependency is traversed, and therefore added to the order, when it is
/// pending:
///
/// - it is in `to_install`, or
/// - it is not installed but the registry has it available.
///
/// Installed dependencies are satisfied leaves. Dependencies the registry
/// does not know at all are also treated as satisfied (they are assumed to be
/// provided by the platform).
///
/// Roots are visited in name order and dependencies in catalog order, so the
/// same inputs always produce the same order.
///
/// # Errors
///
/// Returns [`CyclicDependencyError`] if a cycle is reachable from `to_install`.
pub fn resolve<C: DependencyCatalog + ?Sized>(
    to_install: &BTreeSet<ModuleName>,
    snapshot: &RegistrySnapshot,
    catalog: &C,
) -> Result<InstallationOrder, CyclicDependencyError> {
    let mut order = Vec::new();
    let mut permanent = HashSet::new();

    for root in to_install {
        if !permanent.contains(root) {
            visit(root, to_install, snapshot, catalog, &mut permanent, &mut order)?;
        }
    }

    tracing::debug!(
        requested = to_install.len(),
        resolved = order.len(),
        "Resolved installation order"
    );

    Ok(InstallationOrder::new(order))
}

/// One entry of the explicit DFS stack.
struct Frame {
    module: ModuleName,
    pending: Vec<ModuleName>,
    next: usize,
}

fn visit<C: DependencyCatalog + ?Sized>(
    root: &ModuleName,
    to_install: &BTreeSet<ModuleName>,
    snapshot: &RegistrySnapshot,
    catalog: &C,
    permanent: &mut HashSet<ModuleName>,
    order: &mut Vec<ModuleName>,
) -> Result<(), CyclicDependencyError> {
    let mut temporary: HashSet<ModuleName> = HashSet::new();
    let mut stack = vec![enter(root, to_install, snapshot, catalog, &mut temporary)];

    while let Some(frame) = stack.last_mut() {
        if frame.next < frame.pending.len() {
            let dep = frame.pending[frame.next].clone();
            frame.next += 1;

            if temporary.contains(&dep) {
                return Err(cycle_error(&stack, dep));
            }
            if permanent.contains(&dep) {
                continue;
            }

            let child = enter(&dep, to_install, snapshot, catalog, &mut temporary);
            stack.push(child);
        } else if let Some(done) = stack.pop() {
            // Post-order: all dependencies of `done` are already in `order`.
            temporary.remove(&done.module);
            permanent.insert(done.module.clone());
            order.push(done.module);
        }
    }

    Ok(())
}

fn enter<C: DependencyCatalog + ?Sized>(
    module: &ModuleName,
    to_install: &BTreeSet<ModuleName>,
    snapshot: &RegistrySnapshot,
    catalog: &C,
    temporary: &mut HashSet<ModuleName>,
) -> Frame {
    temporary.insert(module.clone());

    let pending = catalog
        .dependencies_of(module)
        .into_iter()
        .filter(|dep| is_pending(dep, to_install, snapshot))
        .collect();

    Frame {
        module: module.clone(),
        pending,
        next: 0,
    }
}

fn is_pending(dep: &ModuleName, to_install: &BTreeSet<ModuleName>, snapshot: &RegistrySnapshot) -> bool {
    to_install.contains(dep) || (!snapshot.is_installed(dep) && snapshot.is_available(dep))
}

fn cycle_error(stack: &[Frame], module: ModuleName) -> CyclicDependencyError {
    let start = stack
        .iter()
        .position(|f| f.module == module)
        .unwrap_or_default();

    let mut chain: Vec<ModuleName> = stack[start..].iter().map(|f| f.module.clone()).collect();
    chain.push(module.clone());

    CyclicDependencyError { module, chain }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;

    fn set(names: &[&str]) -> BTreeSet<ModuleName> {
        names.iter().map(|n| ModuleName::from(*n)).collect()
    }

    fn snapshot(installed: &[&str], available: &[&str]) -> RegistrySnapshot {
        RegistrySnapshot {
            installed: set(installed),
            available: set(available),
        }
    }

    fn assert_topological(order: &InstallationOrder, catalog: &StaticCatalog) {
        for (i, module) in order.iter().enumerate() {
            for dep in catalog.dependencies_of(module) {
                if let Some(pos) = order.position(&dep) {
                    assert!(pos < i, "{dep} must come before {module} in {order:?}");
                }
            }
        }
    }

    #[test]
    fn test_end_to_end_scenario_order() {
        let catalog = StaticCatalog::new()
            .with("sale", &["base", "product"])
            .with("product", &["base"])
            .with("base", &[]);
        let state = snapshot(&["base"], &["base", "product", "sale"]);

        let order = resolve(&set(&["sale"]), &state, &catalog).unwrap();

        assert_eq!(order.as_slice(), ["product", "sale"].map(ModuleName::from));
    }

    #[test]
    fn test_complex_resolution() {
        let catalog = StaticCatalog::new()
            .with("a", &["b", "c"])
            .with("b", &["d"])
            .with("c", &["d"])
            .with("d", &[]);
        let state = snapshot(&[], &["a", "b", "c", "d"]);

        let order = resolve(&set(&["a"]), &state, &catalog).unwrap();

        assert_eq!(order.len(), 4);
        assert_topological(&order, &catalog);
        assert_eq!(order.as_slice(), ["d", "b", "c", "a"].map(ModuleName::from));
    }

    #[test]
    fn test_roots_visited_in_name_order() {
        let catalog = StaticCatalog::new();
        let state = snapshot(&[], &["crm", "account", "stock"]);

        let order = resolve(&set(&["stock", "crm", "account"]), &state, &catalog).unwrap();

        assert_eq!(order.as_slice(), ["account", "crm", "stock"].map(ModuleName::from));
    }

    #[test]
    fn test_cycle_detection() {
        let catalog = StaticCatalog::new().with("a", &["b"]).with("b", &["a"]);
        let state = snapshot(&[], &["a", "b"]);

        let err = resolve(&set(&["a", "b"]), &state, &catalog).unwrap_err();

        assert_eq!(err.module, "a");
        assert_eq!(err.chain, ["a", "b", "a"].map(ModuleName::from));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let catalog = StaticCatalog::new().with("a", &["a"]);
        let state = snapshot(&[], &["a"]);

        let err = resolve(&set(&["a"]), &state, &catalog).unwrap_err();
        assert_eq!(err.chain, ["a", "a"].map(ModuleName::from));
    }

    #[test]
    fn test_cycle_through_installed_module_is_ignored() {
        // b is installed, so the a -> b edge is satisfied and never traversed.
        let catalog = StaticCatalog::new().with("a", &["b"]).with("b", &["a"]);
        let state = snapshot(&["b"], &["a", "b"]);

        let order = resolve(&set(&["a"]), &state, &catalog).unwrap();
        assert_eq!(order.as_slice(), ["a"].map(ModuleName::from));
    }

    #[test]
    fn test_unknown_dependency_is_satisfied_leaf() {
        let catalog = StaticCatalog::new().with("sale", &["web_platform"]);
        let state = snapshot(&[], &["sale"]);

        let order = resolve(&set(&["sale"]), &state, &catalog).unwrap();
        assert_eq!(order.as_slice(), ["sale"].map(ModuleName::from));
    }

    #[test]
    fn test_forced_reinstall_keeps_dependency_order() {
        // Both installed and both forced: account depends on base and must
        // still follow it even though account sorts first.
        let catalog = StaticCatalog::new().with("account", &["base"]);
        let state = snapshot(&["account", "base"], &["account", "base"]);

        let order = resolve(&set(&["account", "base"]), &state, &catalog).unwrap();
        assert_eq!(order.as_slice(), ["base", "account"].map(ModuleName::from));
    }

    #[test]
    fn test_deep_chain() {
        // a -> b -> c -> d -> e
        let names = ["a", "b", "c", "d", "e"];
        let mut catalog = StaticCatalog::new();
        for pair in names.windows(2) {
            catalog.insert(pair[0].into(), vec![pair[1].into()]);
        }
        let state = snapshot(&[], &names);

        let order = resolve(&set(&["a"]), &state, &catalog).unwrap();
        assert_eq!(order.as_slice(), ["e", "d", "c", "b", "a"].map(ModuleName::from));
    }

    #[test]
    fn test_resolution_is_reproducible() {
        let catalog = StaticCatalog::new()
            .with("sale", &["product", "account"])
            .with("purchase", &["product", "account"])
            .with("product", &[]);
        let state = snapshot(&[], &["sale", "purchase", "product", "account"]);
        let roots = set(&["purchase", "sale"]);

        let first = resolve(&roots, &state, &catalog).unwrap();
        let second = resolve(&roots, &state, &catalog).unwrap();

        assert_eq!(first, second);
        assert_topological(&first, &catalog);
    }
}
