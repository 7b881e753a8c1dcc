//! Shared value types for modsync.
//!
//! Everything in this crate is a plain value: module identifiers, registry
//! rows, and the pieces of a reconciliation report. None of it performs I/O.

pub mod report;
pub mod types;

// Re-exports
pub use report::*;
pub use types::*;
