//! SyncEngine implementation
//!
//! Runs one sync invocation end to end: resolve both profiles, snapshot them
//! concurrently, diff, plan against the stored baseline, then either return
//! the plan (dry run) or execute it and record a new baseline.

use serde::Serialize;

use crate::baseline::Baseline;
use crate::diff::{ChangeSummary, diff};
use crate::executor::{CancelFlag, ExecutionReport, SyncExecutor};
use crate::plan::{ConflictPolicy, SyncMode, SyncPlan, SyncPlanner};
use crate::profile::{AccountProfile, PathResolver};
use crate::settings::Settings;
use crate::snapshot::{ConfigSnapshot, SnapshotBuilder};
use crate::{Error, Result};

/// Options for a sync invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub mode: SyncMode,
    pub policy: ConflictPolicy,
    /// If true, plan only; the destination is not touched.
    pub dry_run: bool,
}

/// What a sync invocation produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum SyncResult {
    /// Dry run: the plan that would have been executed
    Planned(SyncPlan),
    /// The plan was executed
    Executed(ExecutionReport),
}

/// Summary of a sync invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub source: AccountProfile,
    pub destination: AccountProfile,
    pub changes: ChangeSummary,
    pub result: SyncResult,
}

/// Engine for synchronizing configuration between account profiles
pub struct SyncEngine {
    resolver: PathResolver,
    builder: SnapshotBuilder,
    cancel: CancelFlag,
}

impl SyncEngine {
    /// Create an engine from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if an ignore pattern is invalid.
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            resolver: PathResolver::from_settings(settings),
            builder: SnapshotBuilder::from_settings(settings)?,
            cancel: CancelFlag::default(),
        })
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// All discovered profiles.
    pub fn profiles(&self) -> Result<Vec<AccountProfile>> {
        self.resolver.discover_profiles()
    }

    /// Snapshot both profiles on separate threads.
    pub fn snapshot_pair(
        &self,
        source: &AccountProfile,
        destination: &AccountProfile,
    ) -> Result<(ConfigSnapshot, ConfigSnapshot)> {
        std::thread::scope(|scope| {
            let src = scope.spawn(|| self.builder.build(source));
            let dst = scope.spawn(|| self.builder.build(destination));
            let src = src.join().unwrap_or_else(|p| std::panic::resume_unwind(p));
            let dst = dst.join().unwrap_or_else(|p| std::panic::resume_unwind(p));
            Ok((src?, dst?))
        })
    }

    /// Sync `source_id` into `destination_id`.
    ///
    /// Nothing in the destination is modified before planning succeeds.
    ///
    /// # Errors
    ///
    /// Discovery, snapshot and baseline errors abort before execution;
    /// [`Error::PartialFailure`] reports an interrupted execution.
    pub fn sync(
        &self,
        source_id: &str,
        destination_id: &str,
        options: &SyncOptions,
    ) -> Result<SyncOutcome> {
        if source_id == destination_id {
            return Err(Error::SameProfile {
                id: source_id.to_string(),
            });
        }

        let profiles = self.resolver.discover_profiles()?;
        let source = pick(&profiles, source_id)?;
        let destination = pick(&profiles, destination_id)?;
        tracing::info!(
            source = %source.id,
            destination = %destination.id,
            mode = ?options.mode,
            policy = ?options.policy,
            "Starting sync"
        );

        let (src_snapshot, dst_snapshot) = self.snapshot_pair(&source, &destination)?;
        let changes = diff(&src_snapshot, &dst_snapshot);
        let summary = changes.summary();

        let baseline_path = Baseline::path_for(&destination.root);
        let baseline = Baseline::load(&baseline_path)?;
        let plan = SyncPlanner::new(options.mode, options.policy)
            .with_baseline(baseline.as_ref())
            .plan(&changes);

        if options.dry_run {
            tracing::info!(operations = plan.effective().count(), "Dry run, nothing executed");
            return Ok(SyncOutcome {
                source,
                destination,
                changes: summary,
                result: SyncResult::Planned(plan),
            });
        }

        let report = SyncExecutor::new()
            .with_cancel_flag(self.cancel.clone())
            .execute(plan)?;

        if report.is_complete() {
            let after = self.builder.build(&destination)?;
            Baseline::after_sync(&source.id, baseline.as_ref(), &src_snapshot, &after)
                .save(&baseline_path)?;
        }
        tracing::info!(changed = report.changed().count(), "Sync finished");

        Ok(SyncOutcome {
            source,
            destination,
            changes: summary,
            result: SyncResult::Executed(report),
        })
    }
}

fn pick(profiles: &[AccountProfile], id: &str) -> Result<AccountProfile> {
    profiles
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .ok_or_else(|| Error::ProfileNotFound {
            id: id.to_string(),
            available: profiles.iter().map(|p| p.id.clone()).collect(),
        })
}
