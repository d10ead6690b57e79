//! Core pipeline for dota2-sync
//!
//! Copies Dota 2 configuration between the Steam accounts on one machine
//! through a staged pipeline:
//!
//! ```text
//! PathResolver -> ConfigSnapshot (source, destination) -> diff -> SyncPlanner -> SyncExecutor
//! ```
//!
//! Everything up to the executor is a pure transformation over in-memory
//! data; only the executor touches the destination.
//!
//! # Example
//!
//! ```no_run
//! use d2sync_core::{Settings, SyncEngine, SyncOptions};
//!
//! fn example() -> d2sync_core::Result<()> {
//!     let engine = SyncEngine::new(&Settings::default())?;
//!     let options = SyncOptions { dry_run: true, ..SyncOptions::default() };
//!     let outcome = engine.sync("11111111", "22222222", &options)?;
//!     println!("{} files differ", outcome.changes.modified);
//!     Ok(())
//! }
//! ```

pub mod baseline;
pub mod diff;
pub mod engine;
pub mod error;
pub mod executor;
pub mod plan;
pub mod profile;
pub mod settings;
pub mod snapshot;

pub use d2sync_fs::{Digest, RelativePath};

pub use baseline::Baseline;
pub use diff::{ChangeEntry, ChangeKind, ChangeSet, ChangeSummary, diff};
pub use engine::{SyncEngine, SyncOptions, SyncOutcome, SyncResult};
pub use error::{Error, Result};
pub use executor::{
    CancelFlag, ContentStager, ExecutionReport, FileCopier, OperationOutcome, OperationState,
    SyncExecutor,
};
pub use plan::{ConflictPolicy, PlanReason, SyncAction, SyncMode, SyncOperation, SyncPlan, SyncPlanner, plan};
pub use profile::{AccountProfile, PathResolver};
pub use settings::Settings;
pub use snapshot::{ConfigSnapshot, FileRecord, IgnoreSet, SnapshotBuilder};
