//! Stage-then-rename I/O with file locking

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// Marker embedded in staging file names, used to recognise leftovers.
pub const STAGING_SUFFIX: &str = ".d2s-tmp";

/// Temp path for staging `target`, in the same directory (same filesystem).
pub fn staging_path(target: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}{}",
        target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        uuid::Uuid::new_v4().simple(),
        STAGING_SUFFIX
    );
    target.with_file_name(temp_name)
}

/// Stage content for `target` through `fill`, then atomically rename it in.
///
/// `fill` writes into a locked temp file next to `target`. If it fails, the
/// temp file is removed and `target` is left exactly as it was.
pub fn stage_then_rename<F>(target: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_path = staging_path(target);
    let result = write_staged(&temp_path, target, fill);
    if result.is_err() {
        discard(&temp_path);
        return result;
    }

    fs::rename(&temp_path, target).map_err(|e| {
        discard(&temp_path);
        Error::io(target, e)
    })
}

fn write_staged<F>(temp_path: &Path, target: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;

    fill(&mut temp_file).map_err(|e| Error::io(temp_path, e))?;
    temp_file.flush().map_err(|e| Error::io(temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;

    Ok(())
}

fn discard(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove staging file");
    }
}

/// Write content atomically to a file.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    stage_then_rename(path, |file| file.write_all(content))
}

/// Copy `source` over `target` via stage-then-rename.
pub fn copy_atomic(source: &Path, target: &Path) -> Result<()> {
    let mut input = File::open(source).map_err(|e| Error::io(source, e))?;
    stage_then_rename(target, |file| std::io::copy(&mut input, file).map(|_| ()))
}

/// Rename `from` to `to`, creating the parent of `to` if needed.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::rename(from, to).map_err(|e| Error::io(from, e))
}

/// Remove a file; a file that is already gone is not an error.
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Remove now-empty directories between `path`'s parent and `root` (exclusive).
pub fn prune_empty_parents(root: &Path, path: &Path) {
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        // Fails on non-empty directories, which ends the walk.
        if fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}
