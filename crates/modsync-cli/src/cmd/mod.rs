//! Subcommand implementations.

pub mod plan;
pub mod reconcile;
pub mod status;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use modsync_core::{Config, FileRegistry, NullReporter, Reconciler, Reporter, StaticCatalog};

use crate::Cli;
use crate::ui::ConsoleReporter;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration.
    pub config: Config,
    /// Emit JSON instead of text.
    pub json: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

impl Context {
    /// Load the configuration named on the command line.
    pub async fn load(cli: &Cli) -> Result<Self> {
        let config = Config::load(&cli.config)
            .await
            .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

        tracing::debug!(
            state_file = %config.registry.state_file.display(),
            catalog_entries = config.catalog.len(),
            "Loaded configuration"
        );

        Ok(Self {
            config,
            json: cli.json,
            quiet: cli.quiet,
        })
    }

    /// A reconciler over the configured registry and catalog.
    ///
    /// Progress goes to the terminal unless output is JSON or quiet.
    pub fn reconciler(&self) -> Reconciler<FileRegistry, StaticCatalog> {
        let reporter: Arc<dyn Reporter> = if self.json || self.quiet {
            Arc::new(NullReporter)
        } else {
            Arc::new(ConsoleReporter::new())
        };

        Reconciler::new(self.config.open_registry(), self.config.catalog.clone())
            .with_reporter(reporter)
    }
}
