//! Sync planning
//!
//! Turns a [`ChangeSet`] into an ordered [`SyncPlan`] for a mode and
//! conflict policy. Planning never touches the filesystem, so the same plan
//! serves dry runs and execution.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use d2sync_fs::{Digest, RelativePath};
use serde::{Deserialize, Serialize};

use crate::baseline::Baseline;
use crate::diff::{ChangeEntry, ChangeKind, ChangeSet};
use crate::snapshot::FileRecord;
use crate::settings::STATE_DIR;

/// Direction semantics for a sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Destination becomes an exact copy of the source
    Mirror,
    /// Copy new and changed files, never delete
    #[default]
    Merge,
}

/// Resolution for files changed on the destination since the last sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    PreferSource,
    PreferDestination,
    #[default]
    BackupBoth,
}

/// What the executor does for one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SyncAction {
    CopyToDestination,
    Skip,
    /// Preserve the current destination content at `backup`, then overwrite
    BackupThenOverwrite { backup: PathBuf },
    Delete,
}

impl SyncAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CopyToDestination => "copy",
            Self::Skip => "skip",
            Self::BackupThenOverwrite { .. } => "backup+copy",
            Self::Delete => "delete",
        }
    }

    pub fn is_effectful(&self) -> bool {
        !matches!(self, Self::Skip)
    }
}

/// Why an operation was planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanReason {
    /// File only exists in the source
    New,
    /// Destination still matches the baseline, only the source moved
    Updated,
    /// Both sides changed since the last sync (or no baseline exists)
    Conflict,
    /// Only the destination changed since the last sync
    DestinationEdited,
    /// Content already identical
    InSync,
    /// File only exists in the destination
    DestinationOnly,
}

impl std::fmt::Display for PlanReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new in source",
            Self::Updated => "updated in source",
            Self::Conflict => "changed on both sides",
            Self::DestinationEdited => "changed only in destination",
            Self::InSync => "already in sync",
            Self::DestinationOnly => "only in destination",
        };
        f.write_str(s)
    }
}

/// One concrete file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOperation {
    pub action: SyncAction,
    pub path: RelativePath,
    pub kind: ChangeKind,
    pub reason: PlanReason,
    /// Source file, absent for destination-only paths
    pub source: Option<PathBuf>,
    pub destination: PathBuf,
    /// Source digest at snapshot time
    pub source_digest: Option<Digest>,
}

/// Ordered operations for one destination root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub mode: SyncMode,
    pub policy: ConflictPolicy,
    destination_root: PathBuf,
    operations: Vec<SyncOperation>,
}

impl SyncPlan {
    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    pub fn operations(&self) -> &[SyncOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<SyncOperation> {
        self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations that would modify the destination.
    pub fn effective(&self) -> impl Iterator<Item = &SyncOperation> {
        self.operations.iter().filter(|op| op.action.is_effectful())
    }

    /// True when executing the plan would change nothing.
    pub fn is_noop(&self) -> bool {
        self.effective().next().is_none()
    }
}

/// Builds [`SyncPlan`]s from change-sets.
#[derive(Debug, Clone)]
pub struct SyncPlanner<'a> {
    mode: SyncMode,
    policy: ConflictPolicy,
    baseline: Option<&'a Baseline>,
    backup_stamp: String,
}

impl<'a> SyncPlanner<'a> {
    /// Planner with backups stamped with the current time.
    pub fn new(mode: SyncMode, policy: ConflictPolicy) -> Self {
        Self {
            mode,
            policy,
            baseline: None,
            backup_stamp: backup_stamp(Utc::now()),
        }
    }

    pub fn with_baseline(mut self, baseline: Option<&'a Baseline>) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_backup_time(mut self, at: DateTime<Utc>) -> Self {
        self.backup_stamp = backup_stamp(at);
        self
    }

    /// Plan one operation per change entry, in change-set order.
    pub fn plan(&self, changes: &ChangeSet) -> SyncPlan {
        let operations = changes
            .entries()
            .iter()
            .map(|entry| self.plan_entry(changes, entry))
            .collect();

        SyncPlan {
            mode: self.mode,
            policy: self.policy,
            destination_root: changes.destination_root().to_path_buf(),
            operations,
        }
    }

    fn plan_entry(&self, changes: &ChangeSet, entry: &ChangeEntry) -> SyncOperation {
        let path = entry.path();
        let destination = path.under(changes.destination_root());
        let source = entry.source().map(|_| path.under(changes.source_root()));

        let (action, reason) = match entry.kind() {
            ChangeKind::Added => (SyncAction::CopyToDestination, PlanReason::New),
            ChangeKind::Unchanged => (SyncAction::Skip, PlanReason::InSync),
            ChangeKind::Removed => match self.mode {
                SyncMode::Mirror => (SyncAction::Delete, PlanReason::DestinationOnly),
                SyncMode::Merge => (SyncAction::Skip, PlanReason::DestinationOnly),
            },
            ChangeKind::Modified => match self.changed_sides(entry) {
                (true, false) => (SyncAction::CopyToDestination, PlanReason::Updated),
                (false, true) => match self.mode {
                    SyncMode::Mirror => {
                        (SyncAction::CopyToDestination, PlanReason::DestinationEdited)
                    }
                    SyncMode::Merge => (SyncAction::Skip, PlanReason::DestinationEdited),
                },
                _ => (self.resolve_conflict(changes, path), PlanReason::Conflict),
            },
        };

        tracing::debug!(path = %path, action = action.label(), %reason, "Planned");

        SyncOperation {
            action,
            path: path.clone(),
            kind: entry.kind(),
            reason,
            source,
            destination,
            source_digest: entry.source().map(|r| r.digest.clone()),
        }
    }

    /// `(source changed, destination changed)` relative to the digest both
    /// sides last agreed on. Without a recorded digest both count as changed.
    fn changed_sides(&self, entry: &ChangeEntry) -> (bool, bool) {
        let Some(recorded) = self.baseline.and_then(|b| b.digest_for(entry.path())) else {
            return (true, true);
        };
        let moved = |record: Option<&FileRecord>| record.is_none_or(|r| &r.digest != recorded);
        (moved(entry.source()), moved(entry.destination()))
    }

    fn resolve_conflict(&self, changes: &ChangeSet, path: &RelativePath) -> SyncAction {
        match self.policy {
            ConflictPolicy::PreferSource => SyncAction::CopyToDestination,
            ConflictPolicy::PreferDestination => SyncAction::Skip,
            ConflictPolicy::BackupBoth => SyncAction::BackupThenOverwrite {
                backup: path.under(
                    &changes
                        .destination_root()
                        .join(STATE_DIR)
                        .join("backups")
                        .join(&self.backup_stamp),
                ),
            },
        }
    }
}

/// Plan with the current time as backup stamp and no baseline.
pub fn plan(changes: &ChangeSet, mode: SyncMode, policy: ConflictPolicy) -> SyncPlan {
    SyncPlanner::new(mode, policy).plan(changes)
}

fn backup_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%3fZ").to_string()
}
