//! `modsync plan`

use anyhow::{Context as _, Result};

use super::Context;
use crate::ui;

/// Print the delta and installation order for `modules` without installing.
pub async fn plan(ctx: &Context, modules: &[String], force: bool) -> Result<()> {
    let plan = ctx
        .reconciler()
        .plan(modules.iter().map(String::as_str), force)
        .await
        .context("Planning failed")?;

    if ctx.json {
        ui::print_json(&plan)
    } else {
        ui::print_plan(&plan);
        Ok(())
    }
}
