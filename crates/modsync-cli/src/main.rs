//! modsync - incremental module reconciliation CLI

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use modsync_cli::cmd::{self, Context};
use modsync_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context::load(&cli).await?;

    match cli.command {
        Commands::Reconcile { modules, force } => {
            cmd::reconcile::reconcile(&ctx, &modules, force).await
        }
        Commands::Plan { modules, force } => {
            cmd::plan::plan(&ctx, &modules, force).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            cmd::status::status(&ctx).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
