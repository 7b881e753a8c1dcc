//! modsync core - incremental module reconciliation
//!
//! Drives a module registry toward a requested set of installed modules
//! without reinitializing it. A run is a strict forward pipeline:
//!
//! ```text
//! probe --> compute_delta --> resolve --> install_all --> validate
//!   |            |               |             |              |
//! snapshot     delta           order        results      validation
//! ```
//!
//! The registry and the dependency catalog are injected collaborators
//! ([`Registry`], [`DependencyCatalog`]); every component receives the
//! registry handle explicitly. The only fatal failures are a registry that
//! cannot be queried up front and a dependency cycle. Everything that goes
//! wrong from the first install on is folded into the final report.

pub mod catalog;
pub mod config;
pub mod delta;
pub mod error;
pub mod installer;
pub mod prober;
pub mod reconciler;
pub mod registry;
pub mod reporter;
pub mod resolver;
pub mod validator;

pub use catalog::{DependencyCatalog, StaticCatalog};
pub use config::{Config, ConfigError, RegistryConfig};
pub use error::{CyclicDependencyError, ProbeError, ReconcileError};
pub use reconciler::{Phase, Reconciler};
pub use registry::{FileRegistry, MemoryRegistry, Registry, RegistryError};
pub use reporter::{NullReporter, Reporter};

pub use modsync_schema as schema;
pub use tokio_util::sync::CancellationToken;
