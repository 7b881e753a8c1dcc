//! Terminal output.

mod render;
mod reporter;

pub use render::{print_plan, print_report, print_status};
pub use reporter::ConsoleReporter;

use anyhow::Result;
use modsync_core::schema::{ModuleName, Outcome, ReconciliationReport};
use serde::Serialize;

/// JSON shape of `modsync reconcile --json`: the report plus its verdict.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// The full report.
    #[serde(flatten)]
    pub report: &'a ReconciliationReport,
    /// Modules installed only as dependencies.
    pub pulled_in: Vec<ModuleName>,
    /// Overall verdict.
    pub outcome: Outcome,
}

impl<'a> JsonReport<'a> {
    /// Wrap `report`.
    pub fn new(report: &'a ReconciliationReport) -> Self {
        Self {
            report,
            pulled_in: report.pulled_in(),
            outcome: report.outcome(),
        }
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
