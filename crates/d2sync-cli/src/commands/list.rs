//! List command implementation

use colored::Colorize;

use d2sync_core::{Settings, SyncEngine};

use crate::error::Result;
use crate::output;

/// Print every discovered account profile.
pub fn run_list(settings: &Settings, json: bool) -> Result<()> {
    let engine = SyncEngine::new(settings)?;
    let profiles = engine.profiles()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    println!(
        "{} Found {} account(s):",
        "=>".blue().bold(),
        profiles.len()
    );
    for profile in &profiles {
        output::print_profile(profile);
    }
    Ok(())
}
