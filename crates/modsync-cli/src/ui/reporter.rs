//! Terminal progress reporter.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crossterm::style::Stylize;
use modsync_core::schema::{ModuleName, Plan};
use modsync_core::{Phase, Reporter};

const NAME_WIDTH: usize = 24;

/// Prints progress lines as the reconciler works.
///
/// Each install is one line: the counter and module name are printed when
/// the install starts, the status is appended when it ends.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    open_line: Mutex<Option<ModuleName>>,
}

impl ConsoleReporter {
    /// A reporter writing to stdout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the pending line for `module`, or start a fresh one for it.
    fn finish_line(&self, module: &ModuleName) {
        let mut open = self.open_line.lock().unwrap_or_else(PoisonError::into_inner);
        if open.take().as_ref() != Some(module) {
            print!("  {:<w$} ", module.as_str(), w = NAME_WIDTH + 8);
        }
    }
}

impl Reporter for ConsoleReporter {
    fn phase(&self, phase: Phase) {
        match phase {
            Phase::Installing => {
                println!();
                println!("{}", "Installing".bold());
            }
            Phase::Validating => {
                println!();
                println!("{}", "Validating".dark_grey());
            }
            _ => {}
        }
    }

    fn planned(&self, plan: &Plan) {
        let pulled_in: Vec<&str> = plan
            .order
            .iter()
            .filter(|m| !plan.delta.to_install.contains(*m))
            .map(ModuleName::as_str)
            .collect();

        println!(
            "{}",
            format!(
                "{} requested, {} to install, {} already installed",
                plan.delta.requested.len(),
                plan.delta.to_install.len(),
                plan.delta.already_installed.len()
            )
            .dark_grey()
        );
        if !pulled_in.is_empty() {
            println!(
                "{}",
                format!("Pulling in dependencies: {}", pulled_in.join(", ")).dark_grey()
            );
        }
    }

    fn installing(&self, module: &ModuleName, current: usize, total: usize) {
        let counter = format!("[{current}/{total}]");
        print!(
            "  {} {:<w$} ",
            counter.dark_grey(),
            module.as_str(),
            w = NAME_WIDTH
        );
        let _ = std::io::stdout().flush();
        *self.open_line.lock().unwrap_or_else(PoisonError::into_inner) = Some(module.clone());
    }

    fn done(&self, module: &ModuleName, detail: &str) {
        self.finish_line(module);
        println!("{} {}", "done".green().bold(), detail.dark_grey());
    }

    fn failed(&self, module: &ModuleName, reason: &str) {
        self.finish_line(module);
        println!("{} {}", "failed".red().bold(), reason.dark_grey());
    }

    fn warning(&self, msg: &str) {
        println!("{} {}", "warning:".yellow().bold(), msg);
    }
}
