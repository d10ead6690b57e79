//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use d2sync_core::{ConflictPolicy, SyncMode};

/// dota2-sync - Copy and sync Dota 2 configuration between Steam accounts
#[derive(Parser, Debug)]
#[command(name = "dota2-sync")]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to <config dir>/dota2-sync/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Steam userdata directory to search (repeatable)
    #[arg(long = "steam-root", global = true, value_name = "DIR", env = "DOTA2_SYNC_STEAM_ROOT")]
    pub steam_roots: Vec<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Copy configuration from one account to another
    ///
    /// Examples:
    ///   dota2-sync sync 11111111 22222222
    ///   dota2-sync sync 11111111 22222222 --mode mirror --dry-run
    ///   dota2-sync sync 11111111 22222222 --on-conflict prefer-source
    Sync {
        /// Account id to copy from
        source: String,

        /// Account id to copy into
        destination: String,

        /// mirror: make destination an exact copy; merge: never delete
        #[arg(long, value_enum, default_value_t = ModeArg::Merge)]
        mode: ModeArg,

        /// How to resolve files changed on both sides
        #[arg(long = "on-conflict", value_enum, default_value_t = ConflictArg::BackupBoth)]
        on_conflict: ConflictArg,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List discovered Steam accounts
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Mirror,
    Merge,
}

impl From<ModeArg> for SyncMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Mirror => SyncMode::Mirror,
            ModeArg::Merge => SyncMode::Merge,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictArg {
    PreferSource,
    PreferDestination,
    BackupBoth,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(policy: ConflictArg) -> Self {
        match policy {
            ConflictArg::PreferSource => ConflictPolicy::PreferSource,
            ConflictArg::PreferDestination => ConflictPolicy::PreferDestination,
            ConflictArg::BackupBoth => ConflictPolicy::BackupBoth,
        }
    }
}
