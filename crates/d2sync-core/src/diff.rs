//! Snapshot comparison
//!
//! [`diff`] merge-walks two snapshots in path order and classifies every
//! path present in either side. It is pure and total.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use d2sync_fs::RelativePath;
use serde::{Deserialize, Serialize};

use crate::snapshot::{ConfigSnapshot, FileRecord};

/// How a path differs between source and destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Present only in the source
    Added,
    /// Present only in the destination
    Removed,
    /// Present in both with different content
    Modified,
    /// Present in both with identical content
    Unchanged,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// One path's comparison result. At least one side is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEntry {
    path: RelativePath,
    kind: ChangeKind,
    source: Option<FileRecord>,
    destination: Option<FileRecord>,
}

impl ChangeEntry {
    pub fn added(source: FileRecord) -> Self {
        Self {
            path: source.path.clone(),
            kind: ChangeKind::Added,
            source: Some(source),
            destination: None,
        }
    }

    pub fn removed(destination: FileRecord) -> Self {
        Self {
            path: destination.path.clone(),
            kind: ChangeKind::Removed,
            source: None,
            destination: Some(destination),
        }
    }

    /// Compare two records for the same path. Content digest decides;
    /// timestamps are ignored.
    pub fn compared(source: FileRecord, destination: FileRecord) -> Self {
        let kind = if source.digest == destination.digest {
            ChangeKind::Unchanged
        } else {
            ChangeKind::Modified
        };
        Self {
            path: source.path.clone(),
            kind,
            source: Some(source),
            destination: Some(destination),
        }
    }

    pub fn path(&self) -> &RelativePath {
        &self.path
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn source(&self) -> Option<&FileRecord> {
        self.source.as_ref()
    }

    pub fn destination(&self) -> Option<&FileRecord> {
        self.destination.as_ref()
    }
}

/// Per-kind entry counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl ChangeSummary {
    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified + self.unchanged
    }
}

/// Path-sorted comparison of a source and a destination snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    source_root: PathBuf,
    destination_root: PathBuf,
    entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for entry in &self.entries {
            match entry.kind {
                ChangeKind::Added => summary.added += 1,
                ChangeKind::Removed => summary.removed += 1,
                ChangeKind::Modified => summary.modified += 1,
                ChangeKind::Unchanged => summary.unchanged += 1,
            }
        }
        summary
    }

    /// True when every entry is [`ChangeKind::Unchanged`].
    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.kind == ChangeKind::Unchanged)
    }
}

/// Compare `source` against `destination` in one linear merge-walk.
pub fn diff(source: &ConfigSnapshot, destination: &ConfigSnapshot) -> ChangeSet {
    let mut entries = Vec::with_capacity(source.len().max(destination.len()));
    let mut src = source.records().peekable();
    let mut dst = destination.records().peekable();

    loop {
        let order = match (src.peek(), dst.peek()) {
            (Some(s), Some(d)) => s.path.cmp(&d.path),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };

        let entry = match order {
            Ordering::Less => src.next().cloned().map(ChangeEntry::added),
            Ordering::Greater => dst.next().cloned().map(ChangeEntry::removed),
            Ordering::Equal => src
                .next()
                .cloned()
                .zip(dst.next().cloned())
                .map(|(s, d)| ChangeEntry::compared(s, d)),
        };
        entries.extend(entry);
    }

    ChangeSet {
        source_root: source.root().to_path_buf(),
        destination_root: destination.root().to_path_buf(),
        entries,
    }
}
