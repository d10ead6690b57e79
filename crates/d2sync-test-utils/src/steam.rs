//! [`TestSteam`] builder for account-profile test scenarios.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// App directory used for every fake account.
pub const DOTA2_APP_ID: u32 = 570;

/// A temporary Steam `userdata` directory with helpers to populate and
/// inspect account profiles.
///
/// # Example
///
/// ```rust,no_run
/// use d2sync_test_utils::TestSteam;
///
/// let steam = TestSteam::new();
/// steam.write("11111111", "remote/cfg/autoexec.cfg", "fps_max 240");
/// assert_eq!(steam.read("11111111", "remote/cfg/autoexec.cfg").as_deref(), Some("fps_max 240"));
/// ```
pub struct TestSteam {
    temp_dir: TempDir,
}

impl Default for TestSteam {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSteam {
    /// Create an empty `userdata` directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("userdata")).unwrap();
        Self { temp_dir }
    }

    /// The `userdata` directory (the search root to hand to discovery).
    pub fn userdata(&self) -> PathBuf {
        self.temp_dir.path().join("userdata")
    }

    /// Scratch space next to `userdata`, outside every profile.
    pub fn scratch(&self) -> PathBuf {
        let dir = self.temp_dir.path().join("scratch");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Profile root of `account`.
    pub fn profile_root(&self, account: &str) -> PathBuf {
        self.userdata().join(account).join(DOTA2_APP_ID.to_string())
    }

    /// Create an account with the app directory present.
    pub fn add_account(&self, account: &str) -> PathBuf {
        let root = self.profile_root(account);
        fs::create_dir_all(&root).unwrap();
        root
    }

    /// Create an account directory without the app installed.
    pub fn add_account_without_app(&self, account: &str) -> PathBuf {
        let dir = self.userdata().join(account);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Write a file into an account's profile, creating the account.
    pub fn write(&self, account: &str, rel: &str, content: &str) -> PathBuf {
        let path = self.add_account(account).join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write several files into an account's profile.
    pub fn write_all(&self, account: &str, files: &[(&str, &str)]) {
        self.add_account(account);
        for (rel, content) in files {
            self.write(account, rel, content);
        }
    }

    /// Read a profile file, `None` if absent.
    pub fn read(&self, account: &str, rel: &str) -> Option<String> {
        fs::read_to_string(self.profile_root(account).join(rel)).ok()
    }

    /// All files of a profile outside the `.dota2-sync` state directory,
    /// keyed by forward-slash relative path.
    pub fn files(&self, account: &str) -> BTreeMap<String, String> {
        collect_files(&self.profile_root(account), |rel| !rel.starts_with(".dota2-sync/"))
    }

    /// All files under the `.dota2-sync/backups` directory of a profile.
    pub fn backups(&self, account: &str) -> BTreeMap<String, String> {
        let dir = self.profile_root(account).join(".dota2-sync").join("backups");
        collect_files(&dir, |_| true)
    }
}

/// Convenience for building an expected file map in assertions.
pub fn file_map(files: &[(&str, &str)]) -> BTreeMap<String, String> {
    files
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn collect_files(root: &Path, keep: impl Fn(&str) -> bool) -> BTreeMap<String, String> {
    if !root.exists() {
        return BTreeMap::new();
    }
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let rel = e
                .path()
                .strip_prefix(root)
                .ok()?
                .to_string_lossy()
                .replace('\\', "/");
            if !keep(&rel) {
                return None;
            }
            let content = fs::read_to_string(e.path()).ok()?;
            Some((rel, content))
        })
        .collect()
}
