//! Plain-text rendering of reports, plans and registry status.

use crossterm::style::Stylize;
use modsync_core::schema::{
    ModuleName, Outcome, PartialOutcome, Plan, ReconciliationReport, RegistrySnapshot,
};

const LABEL_WIDTH: usize = 20;

fn join<'a>(names: impl IntoIterator<Item = &'a ModuleName>) -> String {
    let names: Vec<&str> = names.into_iter().map(ModuleName::as_str).collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

fn row(label: &str, value: &str) {
    println!("  {label:<LABEL_WIDTH$}{value}");
}

/// Print the outcome of a reconciliation.
pub fn print_report(report: &ReconciliationReport) {
    println!();
    println!("{}", "Summary".dark_grey());
    println!();

    let installed: Vec<&ModuleName> = report
        .results
        .iter()
        .filter(|r| r.succeeded)
        .map(|r| &r.module)
        .collect();

    row("Requested:", &join(&report.delta.requested));
    row("Already installed:", &join(&report.delta.already_installed));
    row("Installed:", &join(installed));
    if !report.pulled_in().is_empty() {
        row("Dependencies:", &join(&report.pulled_in()));
    }

    println!();
    match report.outcome() {
        Outcome::Success => {
            println!("{}", "All requested modules are installed".green().bold());
        }
        Outcome::Partial(partial) => print_partial(&partial),
    }
    if let Some(error) = &report.validation.error {
        row("Not validated:", &error.as_str().red().to_string());
    }
    println!();
}

fn print_partial(partial: &PartialOutcome) {
    println!("{}", "Reconciliation incomplete".yellow().bold());
    if !partial.failed.is_empty() {
        row("Failed:", &join(&partial.failed));
    }
    if !partial.cancelled.is_empty() {
        row("Cancelled:", &join(&partial.cancelled));
    }
    if !partial.unavailable.is_empty() {
        row("Unavailable:", &join(&partial.unavailable));
    }
    if !partial.missing.is_empty() {
        row("Still missing:", &join(&partial.missing));
    }
}

/// Print what a reconciliation would do.
pub fn print_plan(plan: &Plan) {
    println!();
    println!("{}", "Plan".dark_grey());
    println!();

    row("Requested:", &join(&plan.delta.requested));
    row("Already installed:", &join(&plan.delta.already_installed));
    row("To install:", &join(&plan.delta.to_install));
    if !plan.delta.unavailable.is_empty() {
        row("Unavailable:", &join(&plan.delta.unavailable).red().to_string());
    }

    println!();
    if plan.order.is_empty() {
        println!("{}", "Nothing to install".dark_grey());
    } else {
        println!("{}", "Installation order".dark_grey());
        for (i, module) in plan.order.iter().enumerate() {
            let note = if plan.delta.to_install.contains(module) {
                String::new()
            } else {
                "(dependency)".dark_grey().to_string()
            };
            println!("  {:>3}. {} {}", i + 1, module.as_str().bold(), note);
        }
    }
    println!();
}

/// Print installed and available modules.
pub fn print_status(snapshot: &RegistrySnapshot) {
    let not_installed: Vec<&ModuleName> = snapshot
        .available
        .iter()
        .filter(|m| !snapshot.installed.contains(*m))
        .collect();

    println!();
    println!("{}", "Registry status".dark_grey());
    println!();
    row(
        "Installed:",
        &format!("{} of {}", snapshot.installed.len(), snapshot.available.len()),
    );
    println!();

    for module in &snapshot.installed {
        println!("  {} {}", "+".green(), module);
    }
    for module in not_installed {
        println!("  {} {}", "-".dark_grey(), module.as_str().dark_grey());
    }
    println!();
}
