//! Snapshot construction
//!
//! Walks a profile root (following symbolic links, never re-entering a
//! directory already visited) and hashes the collected files on a bounded
//! pool of scoped worker threads.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use d2sync_fs::{Digest, RelativePath};
use walkdir::WalkDir;

use super::{ConfigSnapshot, FileRecord, IgnoreSet};
use crate::profile::AccountProfile;
use crate::settings::Settings;
use crate::{Error, Result};

/// Builds [`ConfigSnapshot`]s for profiles.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    ignore: IgnoreSet,
    workers: usize,
}

impl SnapshotBuilder {
    pub fn new(ignore: IgnoreSet, workers: usize) -> Self {
        Self {
            ignore,
            workers: workers.max(1),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(IgnoreSet::new(&settings.ignore)?, settings.workers))
    }

    /// Build a snapshot of `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] with the offending path if the root or any file
    /// below it cannot be read.
    pub fn build(&self, profile: &AccountProfile) -> Result<ConfigSnapshot> {
        let root = profile.root.as_path();
        fs::read_dir(root).map_err(|e| Error::io(root, e))?;

        let files = self.collect_files(root)?;
        let records = self.hash_files(&files)?;

        tracing::debug!(
            account = %profile.id,
            files = records.len(),
            "Built snapshot"
        );
        ConfigSnapshot::from_records(&profile.id, root, records)
    }

    fn collect_files(&self, root: &Path) -> Result<Vec<(RelativePath, PathBuf)>> {
        let mut visited = HashSet::new();
        visited.insert(dunce::canonicalize(root).map_err(|e| Error::io(root, e))?);

        let mut files = Vec::new();
        let mut walker = WalkDir::new(root)
            .follow_links(true)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.loop_ancestor().is_some() => {
                    tracing::warn!(
                        path = %err.path().unwrap_or(root).display(),
                        "Skipping symbolic link loop"
                    );
                    continue;
                }
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    return Err(Error::io(path, std::io::Error::from(err)));
                }
            };

            let rel = RelativePath::from_root(root, entry.path())?;

            if entry.file_type().is_dir() {
                if self.ignore.is_ignored_dir(&rel) {
                    walker.skip_current_dir();
                    continue;
                }
                let canonical =
                    dunce::canonicalize(entry.path()).map_err(|e| Error::io(entry.path(), e))?;
                if !visited.insert(canonical) {
                    tracing::warn!(
                        path = %entry.path().display(),
                        "Directory already visited through another link, not re-entering"
                    );
                    walker.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() || self.ignore.is_ignored(&rel) {
                continue;
            }
            files.push((rel, entry.into_path()));
        }

        Ok(files)
    }

    fn hash_files(&self, files: &[(RelativePath, PathBuf)]) -> Result<Vec<FileRecord>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = files.len().div_ceil(self.workers);
        std::thread::scope(|scope| {
            let handles: Vec<_> = files
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || chunk.iter().map(hash_file).collect::<Result<Vec<_>>>()))
                .collect();

            let mut records = Vec::with_capacity(files.len());
            for handle in handles {
                let chunk = handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))?;
                records.extend(chunk);
            }
            Ok(records)
        })
    }
}

fn hash_file((rel, path): &(RelativePath, PathBuf)) -> Result<FileRecord> {
    let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
    let digest = Digest::of_file(path).map_err(|e| Error::io(path, e))?;

    Ok(FileRecord {
        path: rel.clone(),
        size: metadata.len(),
        digest,
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
    })
}
