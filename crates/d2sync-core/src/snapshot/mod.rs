//! Point-in-time catalogs of a profile's configuration files
//!
//! - **ConfigSnapshot**: immutable sorted map of relative path to [`FileRecord`]
//! - **SnapshotBuilder**: walks a profile root and hashes every regular file
//! - **IgnoreSet**: glob patterns excluded from snapshots

mod builder;
mod ignore;

pub use builder::SnapshotBuilder;
pub use ignore::IgnoreSet;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use d2sync_fs::{Digest, RelativePath};
use serde::Serialize;

use crate::{Error, Result};

/// One regular file inside a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path relative to the profile root
    pub path: RelativePath,
    /// Size in bytes
    pub size: u64,
    /// Content digest
    pub digest: Digest,
    /// Last modification time, when the platform reports one
    pub modified: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Record for in-memory content, with no timestamp.
    pub fn from_content(path: RelativePath, content: &[u8]) -> Self {
        Self {
            path,
            size: content.len() as u64,
            digest: Digest::of_bytes(content),
            modified: None,
        }
    }
}

/// The set of files under one account root at a point in time.
///
/// Records are keyed by normalized relative path, so iteration is always in
/// lexicographic path order and no two records share a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    account: String,
    root: PathBuf,
    records: BTreeMap<RelativePath, FileRecord>,
}

impl ConfigSnapshot {
    /// Build a snapshot from records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRecord`] if two records share a path.
    pub fn from_records(
        account: impl Into<String>,
        root: impl Into<PathBuf>,
        records: impl IntoIterator<Item = FileRecord>,
    ) -> Result<Self> {
        let account = account.into();
        let mut map = BTreeMap::new();
        for record in records {
            let path = record.path.clone();
            if map.insert(path.clone(), record).is_some() {
                return Err(Error::DuplicateRecord {
                    account,
                    path: path.to_string(),
                });
            }
        }
        Ok(Self {
            account,
            root: root.into(),
            records: map,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, path: &RelativePath) -> Option<&FileRecord> {
        self.records.get(path)
    }

    /// Records in path order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    pub fn total_size(&self) -> u64 {
        self.records.values().map(|r| r.size).sum()
    }
}
