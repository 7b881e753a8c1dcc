//! `modsync reconcile`

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use modsync_core::CancellationToken;
use modsync_core::schema::ReconciliationReport;

use super::Context;
use crate::EXIT_PARTIAL;
use crate::ui;

/// Reconcile the registry with `modules`.
///
/// Ctrl-C lets the install in flight finish and skips the rest; the report
/// still gets printed.
pub async fn reconcile(ctx: &Context, modules: &[String], force: bool) -> Result<ExitCode> {
    let reconciler = ctx.reconciler();

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let result = reconciler
        .reconcile_with_cancel(modules.iter().map(String::as_str), force, &cancel)
        .await;
    watcher.abort();

    let report = result.context("Reconciliation failed")?;
    render(ctx, &report)?;

    if report.outcome().is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_PARTIAL))
    }
}

fn render(ctx: &Context, report: &ReconciliationReport) -> Result<()> {
    if ctx.json {
        ui::print_json(&ui::JsonReport::new(report))
    } else {
        ui::print_report(report);
        Ok(())
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("Interrupted, remaining installs will be skipped");
        cancel.cancel();
    }
}
