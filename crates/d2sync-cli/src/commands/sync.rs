//! Sync command implementation

use colored::Colorize;

use d2sync_core::{Error as CoreError, Settings, SyncEngine, SyncOptions, SyncResult};

use crate::error::{CliError, Result};
use crate::output;

/// Run the sync command
///
/// A partially applied run prints its report before returning the error.
pub fn run_sync(
    settings: &Settings,
    source: &str,
    destination: &str,
    options: &SyncOptions,
    json: bool,
) -> Result<()> {
    let engine = SyncEngine::new(settings)?;

    if !json {
        let verb = if options.dry_run { "Planning" } else { "Syncing" };
        println!(
            "{} {} {} -> {} ({}, on conflict: {})",
            "=>".blue().bold(),
            verb,
            source.cyan(),
            destination.cyan(),
            output::mode_name(options.mode),
            output::policy_name(options.policy),
        );
    }

    let outcome = match engine.sync(source, destination, options) {
        Ok(outcome) => outcome,
        Err(CoreError::PartialFailure { report }) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_report(&report);
            }
            let message = CoreError::PartialFailure { report }.to_string();
            return Err(CliError::Partial { message });
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    output::print_summary(&outcome.changes);
    match &outcome.result {
        SyncResult::Planned(plan) => {
            output::print_plan(plan);
            println!();
            println!("{} Dry run, no files were modified.", "DRY RUN".yellow().bold());
        }
        SyncResult::Executed(report) => {
            output::print_report(report);
            let cancelled = report.cancelled().count();
            if cancelled > 0 {
                println!(
                    "{} Cancelled with {} operation(s) not started.",
                    "CANCELLED".yellow().bold(),
                    cancelled
                );
            } else {
                println!(
                    "{} {} file(s) updated.",
                    "OK".green().bold(),
                    report.changed().count()
                );
            }
        }
    }
    Ok(())
}
