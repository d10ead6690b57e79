//! Plan execution
//!
//! Operations run strictly in plan order on the calling thread. Every write
//! goes through stage-then-rename, so the destination never observes a
//! half-written file. The first failure stops the run; committed operations
//! are not rolled back, and the report says exactly what happened.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use d2sync_fs::Digest;
use serde::Serialize;

use crate::plan::{SyncAction, SyncOperation, SyncPlan};
use crate::{Error, Result};

/// Lifecycle of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Pending,
    InProgress,
    Committed,
    Failed,
    /// Not started because cancellation was requested
    Cancelled,
}

/// Final state of one operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub operation: SyncOperation,
    pub state: OperationState,
    /// Whether the destination was actually modified
    pub changed: bool,
    pub error: Option<String>,
}

impl OperationOutcome {
    fn pending(operation: SyncOperation) -> Self {
        Self {
            operation,
            state: OperationState::Pending,
            changed: false,
            error: None,
        }
    }
}

/// Result of executing a plan.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub outcomes: Vec<OperationOutcome>,
}

impl ExecutionReport {
    fn in_state(&self, state: OperationState) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(move |o| o.state == state)
    }

    pub fn committed(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.in_state(OperationState::Committed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.in_state(OperationState::Failed)
    }

    pub fn cancelled(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.in_state(OperationState::Cancelled)
    }

    /// Operations never started because an earlier one failed.
    pub fn not_run(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.in_state(OperationState::Pending)
    }

    /// Committed operations that modified the destination.
    pub fn changed(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.committed().filter(|o| o.changed)
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.state == OperationState::Committed)
    }
}

/// Cooperative cancellation, honored between operations only.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Writes source content into a staging file.
pub trait ContentStager {
    fn stage(&self, source: &Path, staging: &mut File) -> io::Result<()>;
}

/// Plain byte-for-byte copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCopier;

impl ContentStager for FileCopier {
    fn stage(&self, source: &Path, staging: &mut File) -> io::Result<()> {
        let mut input = File::open(source)?;
        io::copy(&mut input, staging).map(|_| ())
    }
}

/// Applies [`SyncPlan`]s.
#[derive(Debug, Clone, Default)]
pub struct SyncExecutor<S = FileCopier> {
    stager: S,
    cancel: CancelFlag,
}

impl SyncExecutor<FileCopier> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: ContentStager> SyncExecutor<S> {
    pub fn with_stager(stager: S) -> Self {
        Self {
            stager,
            cancel: CancelFlag::default(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute all operations in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartialFailure`] carrying the full report when any
    /// operation fails. Cancellation is not an error; cancelled operations
    /// are reported as such.
    pub fn execute(&self, plan: SyncPlan) -> Result<ExecutionReport> {
        let root = plan.destination_root().to_path_buf();
        let mut outcomes: Vec<OperationOutcome> = plan
            .into_operations()
            .into_iter()
            .map(OperationOutcome::pending)
            .collect();

        for index in 0..outcomes.len() {
            if self.cancel.is_cancelled() {
                tracing::info!(remaining = outcomes.len() - index, "Sync cancelled");
                for outcome in &mut outcomes[index..] {
                    outcome.state = OperationState::Cancelled;
                }
                break;
            }

            let outcome = &mut outcomes[index];
            outcome.state = OperationState::InProgress;
            match self.apply(&outcome.operation, &root) {
                Ok(changed) => {
                    outcome.state = OperationState::Committed;
                    outcome.changed = changed;
                }
                Err(e) => {
                    tracing::error!(path = %outcome.operation.path, error = %e, "Operation failed");
                    outcome.state = OperationState::Failed;
                    outcome.error = Some(e.to_string());
                    break;
                }
            }
        }

        let report = ExecutionReport { outcomes };
        if report.failed().next().is_some() {
            return Err(Error::PartialFailure {
                report: Box::new(report),
            });
        }
        Ok(report)
    }

    /// Apply one operation; returns whether the destination changed.
    fn apply(&self, op: &SyncOperation, root: &Path) -> Result<bool> {
        match &op.action {
            SyncAction::Skip => Ok(false),
            SyncAction::CopyToDestination => {
                let source = required_source(op)?;
                if already_in_sync(source, &op.destination)? {
                    return Ok(false);
                }
                self.stage_copy(source, &op.destination)?;
                tracing::debug!(path = %op.path, "Copied");
                Ok(true)
            }
            SyncAction::BackupThenOverwrite { backup } => {
                let source = required_source(op)?;
                if already_in_sync(source, &op.destination)? {
                    return Ok(false);
                }
                if op.destination.is_file() {
                    d2sync_fs::io::copy_atomic(&op.destination, backup)?;
                    tracing::info!(path = %op.path, backup = %backup.display(), "Backed up");
                }
                self.stage_copy(source, &op.destination)?;
                Ok(true)
            }
            SyncAction::Delete => {
                let removed = d2sync_fs::io::remove_if_exists(&op.destination)?;
                if removed {
                    d2sync_fs::io::prune_empty_parents(root, &op.destination);
                    tracing::debug!(path = %op.path, "Deleted");
                }
                Ok(removed)
            }
        }
    }

    fn stage_copy(&self, source: &Path, destination: &Path) -> Result<()> {
        d2sync_fs::io::stage_then_rename(destination, |staging| self.stager.stage(source, staging))?;
        Ok(())
    }
}

fn required_source(op: &SyncOperation) -> Result<&Path> {
    op.source.as_deref().ok_or_else(|| {
        Error::io(
            &op.destination,
            io::Error::new(io::ErrorKind::InvalidInput, "operation has no source file"),
        )
    })
}

/// Digests are recomputed from disk, never taken from the snapshot.
fn already_in_sync(source: &Path, destination: &Path) -> Result<bool> {
    if !destination.is_file() {
        return Ok(false);
    }
    let src = Digest::of_file(source).map_err(|e| Error::io(source, e))?;
    let dst = Digest::of_file(destination).map_err(|e| Error::io(destination, e))?;
    Ok(src == dst)
}
