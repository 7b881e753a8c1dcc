//! modsync - incremental module reconciliation
#![allow(clippy::missing_errors_doc)]
//!
//! Command-line driver for `modsync-core`. Reads a `modsync.toml`, opens the
//! file-backed registry it points at, and reconciles that registry with the
//! modules given on the command line.
//!
//! # Exit status
//!
//! - `0`: every requested module is installed
//! - `2`: the run finished but something is still missing (see the report)
//! - `1`: the run could not be carried out (bad config, unreadable registry,
//!   dependency cycle)

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Exit status for a run that finished with a partial outcome.
pub const EXIT_PARTIAL: u8 = 2;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "modsync")]
#[command(
    author,
    version,
    about = "modsync - reconcile a module registry with a requested module set",
    long_about = None
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(
        long,
        global = true,
        env = "MODSYNC_CONFIG",
        default_value = "modsync.toml"
    )]
    pub config: PathBuf,

    /// Print machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install the given modules and whatever they depend on
    Reconcile {
        /// Module names
        #[arg(required = true)]
        modules: Vec<String>,
        /// Reinstall requested modules even if already installed
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Show what `reconcile` would do without installing anything
    Plan {
        /// Module names
        #[arg(required = true)]
        modules: Vec<String>,
        /// Plan as if reinstalling already-installed modules
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Show installed and available modules
    Status,
}
