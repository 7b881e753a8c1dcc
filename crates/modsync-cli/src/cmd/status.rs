//! `modsync status`

use anyhow::{Context as _, Result};

use super::Context;
use crate::ui;

/// Print installed and available modules.
pub async fn status(ctx: &Context) -> Result<()> {
    let snapshot = ctx
        .reconciler()
        .status()
        .await
        .context("Failed to read registry status")?;

    if ctx.json {
        ui::print_json(&snapshot)
    } else {
        ui::print_status(&snapshot);
        Ok(())
    }
}
