//! dota2-sync CLI
//!
//! Copies Dota 2 configuration between the Steam accounts on this machine.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use d2sync_core::Settings;
use error::Result;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::resolve(cli.config.as_deref())?.with_steam_roots(cli.steam_roots);
    tracing::debug!(roots = ?settings.search_roots(), "Settings resolved");

    match cli.command {
        Commands::Sync {
            source,
            destination,
            mode,
            on_conflict,
            dry_run,
            json,
        } => {
            let options = d2sync_core::SyncOptions {
                mode: mode.into(),
                policy: on_conflict.into(),
                dry_run,
            };
            commands::run_sync(&settings, &source, &destination, &options, json)
        }
        Commands::List { json } => commands::run_list(&settings, json),
    }
}
