//! Persisted record of the last successful sync into a destination
//!
//! Stored at `<destination root>/.dota2-sync/baseline.toml` as a schema
//! tagged path→digest map of the last content both sides agreed on. The
//! planner compares each side against it to tell one-sided edits from
//! conflicts.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use d2sync_fs::{Digest, RelativePath};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::settings::STATE_DIR;
use crate::snapshot::ConfigSnapshot;
use crate::{Error, Result};

/// Current on-disk schema tag
pub const BASELINE_SCHEMA: &str = "1";

const BASELINE_FILE: &str = "baseline.toml";

/// Last known-common digests between a source and this destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    /// Schema tag for forward compatibility
    schema: String,
    /// Account the destination was last synced from
    pub source: String,
    /// When the sync finished
    pub synced_at: DateTime<Utc>,
    /// Relative path to digest
    files: BTreeMap<RelativePath, Digest>,
}

impl Baseline {
    pub fn new(
        source: impl Into<String>,
        synced_at: DateTime<Utc>,
        files: BTreeMap<RelativePath, Digest>,
    ) -> Self {
        Self {
            schema: BASELINE_SCHEMA.to_string(),
            source: source.into(),
            synced_at,
            files,
        }
    }

    /// Last known-common state after a sync from `source` into `destination`.
    ///
    /// Paths whose contents now agree record that digest. Paths that still
    /// differ keep the digest from `previous` (if any), so an edit kept on
    /// one side is still recognized as such next time. Paths present on
    /// neither side are dropped.
    pub fn after_sync(
        source_id: impl Into<String>,
        previous: Option<&Baseline>,
        source: &ConfigSnapshot,
        destination: &ConfigSnapshot,
    ) -> Self {
        let mut files = BTreeMap::new();

        for record in destination.records() {
            let path = &record.path;
            let agreed = source
                .get(path)
                .filter(|s| s.digest == record.digest)
                .map(|s| s.digest.clone());
            let digest = agreed.or_else(|| previous.and_then(|b| b.digest_for(path)).cloned());
            if let Some(digest) = digest {
                files.insert(path.clone(), digest);
            }
        }

        // Source-only paths (skipped or not yet copied) keep their old record.
        if let Some(previous) = previous {
            let source_only = source.records().filter(|r| destination.get(&r.path).is_none());
            for record in source_only {
                if let Some(digest) = previous.digest_for(&record.path) {
                    files.insert(record.path.clone(), digest.clone());
                }
            }
        }

        Self::new(source_id, Utc::now(), files)
    }

    /// Location of the baseline file for a destination root.
    pub fn path_for(destination_root: &Path) -> PathBuf {
        destination_root.join(STATE_DIR).join(BASELINE_FILE)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn digest_for(&self, path: &RelativePath) -> Option<&Digest> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Load a baseline with a shared lock. A missing file yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Baseline`] if the file is malformed or carries an
    /// unknown schema tag.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(path, e)),
        };
        file.lock_shared().map_err(|e| Error::io(path, e))?;

        // Read through the locked handle
        let mut content = String::new();
        (&file).read_to_string(&mut content).map_err(|e| Error::io(path, e))?;

        let baseline: Baseline = toml::from_str(&content).map_err(|e| Error::Baseline {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if baseline.schema != BASELINE_SCHEMA {
            return Err(Error::Baseline {
                path: path.to_path_buf(),
                message: format!(
                    "unsupported schema '{}' (expected '{}')",
                    baseline.schema, BASELINE_SCHEMA
                ),
            });
        }
        Ok(Some(baseline))
    }

    /// Save atomically while holding an exclusive lock on a sidecar file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let lock_path = path.with_extension("toml.lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| Error::io(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|_| d2sync_fs::Error::LockFailed {
                path: path.to_path_buf(),
            })?;

        d2sync_fs::io::write_atomic(path, content.as_bytes())?;

        // Lock released when lock_file is dropped
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FileRecord;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample() -> Baseline {
        let mut files = BTreeMap::new();
        files.insert(RelativePath::new("remote/cfg/autoexec.cfg").unwrap(), Digest::of_bytes(b"a"));
        files.insert(RelativePath::new("b.cfg").unwrap(), Digest::of_bytes(b"b"));
        Baseline::new("11111111", Utc::now(), files)
    }

    #[test]
    fn save_then_load_preserves_digests() {
        let dir = tempdir().unwrap();
        let path = Baseline::path_for(dir.path());
        let baseline = sample();

        baseline.save(&path).unwrap();
        let loaded = Baseline::load(&path).unwrap().unwrap();

        assert_eq!(loaded, baseline);
        assert_eq!(
            loaded.digest_for(&RelativePath::new("b.cfg").unwrap()),
            Some(&Digest::of_bytes(b"b"))
        );

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("schema = \"1\""));
        assert!(raw.contains("\"remote/cfg/autoexec.cfg\""));
    }

    #[test]
    fn missing_baseline_is_none() {
        let dir = tempdir().unwrap();
        assert!(Baseline::load(&Baseline::path_for(dir.path())).unwrap().is_none());
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("baseline.toml");
        std::fs::write(
            &path,
            "schema = \"99\"\nsource = \"1\"\nsynced_at = \"2026-01-01T00:00:00Z\"\n[files]\n",
        )
        .unwrap();

        let err = Baseline::load(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported schema"), "got: {err}");
    }

    fn snapshot(root: &str, files: &[(&str, &str)]) -> ConfigSnapshot {
        ConfigSnapshot::from_records(
            root,
            root,
            files.iter().map(|(path, content)| {
                FileRecord::from_content(RelativePath::new(path).unwrap(), content.as_bytes())
            }),
        )
        .unwrap()
    }

    fn digests(baseline: &Baseline) -> Vec<(&str, &Digest)> {
        baseline.files.iter().map(|(p, d)| (p.as_str(), d)).collect()
    }

    #[test]
    fn after_sync_records_only_agreeing_paths() {
        // b.cfg kept its destination content, c.cfg exists only in the destination.
        let source = snapshot("11111111", &[("a.cfg", "1"), ("b.cfg", "2")]);
        let destination = snapshot("22222222", &[("a.cfg", "1"), ("b.cfg", "X"), ("c.cfg", "3")]);

        let baseline = Baseline::after_sync("11111111", None, &source, &destination);

        assert_eq!(digests(&baseline), vec![("a.cfg", &Digest::of_bytes(b"1"))]);
    }

    #[test]
    fn after_sync_keeps_previous_digest_for_diverged_paths() {
        let mut files = BTreeMap::new();
        files.insert(RelativePath::new("b.cfg").unwrap(), Digest::of_bytes(b"old"));
        files.insert(RelativePath::new("gone.cfg").unwrap(), Digest::of_bytes(b"g"));
        let previous = Baseline::new("11111111", Utc::now(), files);

        let source = snapshot("11111111", &[("a.cfg", "1"), ("b.cfg", "2")]);
        let destination = snapshot("22222222", &[("a.cfg", "1"), ("b.cfg", "X")]);

        let baseline = Baseline::after_sync("11111111", Some(&previous), &source, &destination);

        assert_eq!(
            digests(&baseline),
            vec![
                ("a.cfg", &Digest::of_bytes(b"1")),
                ("b.cfg", &Digest::of_bytes(b"old")),
            ]
        );
    }

    #[test]
    fn baseline_lives_in_state_dir() {
        let path = Baseline::path_for(Path::new("/steam/userdata/2/570"));
        assert!(path.ends_with(".dota2-sync/baseline.toml"));
    }
}
