//! Steam account profile discovery
//!
//! A profile is `<userdata>/<account id>/<app id>` for every numeric account
//! directory that has the app installed. Discovery is read-only.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::settings::Settings;
use crate::{Error, Result};

/// One account's configuration root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountProfile {
    /// Steam account id (directory name under `userdata`)
    pub id: String,
    /// Configuration root (`userdata/<id>/<app id>`)
    pub root: PathBuf,
    /// The `userdata` directory this profile was found under
    pub steam_root: PathBuf,
}

/// Locates account profiles under a fixed set of search roots.
#[derive(Debug, Clone)]
pub struct PathResolver {
    search_roots: Vec<PathBuf>,
    app_id: u32,
}

impl PathResolver {
    pub fn new(search_roots: Vec<PathBuf>, app_id: u32) -> Self {
        Self {
            search_roots,
            app_id,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.search_roots(), settings.app_id)
    }

    pub fn search_roots(&self) -> &[PathBuf] {
        &self.search_roots
    }

    /// Discover all profiles, sorted by account id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no search root yields a profile.
    pub fn discover_profiles(&self) -> Result<Vec<AccountProfile>> {
        let mut profiles: Vec<AccountProfile> = Vec::new();
        let mut seen_roots = HashSet::new();

        for steam_root in &self.search_roots {
            for candidate in self.scan_root(steam_root) {
                let canonical =
                    dunce::canonicalize(&candidate.root).unwrap_or_else(|_| candidate.root.clone());

                if !seen_roots.insert(canonical) {
                    tracing::warn!(
                        account = %candidate.id,
                        root = %candidate.root.display(),
                        "Profile root already discovered through another path, ignoring"
                    );
                    continue;
                }
                if let Some(existing) = profiles.iter().find(|p| p.id == candidate.id) {
                    tracing::warn!(
                        account = %candidate.id,
                        kept = %existing.root.display(),
                        ignored = %candidate.root.display(),
                        "Account found under several Steam roots, keeping the first"
                    );
                    continue;
                }
                profiles.push(candidate);
            }
        }

        if profiles.is_empty() {
            return Err(Error::NotFound {
                searched: self.search_roots.clone(),
            });
        }

        profiles.sort_by(|a, b| account_order(&a.id, &b.id));
        tracing::debug!(count = profiles.len(), "Discovered profiles");
        Ok(profiles)
    }

    /// Find a single profile by account id.
    pub fn find_profile(&self, id: &str) -> Result<AccountProfile> {
        let profiles = self.discover_profiles()?;
        let available = profiles.iter().map(|p| p.id.clone()).collect();
        profiles
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::ProfileNotFound {
                id: id.to_string(),
                available,
            })
    }

    fn scan_root(&self, steam_root: &Path) -> Vec<AccountProfile> {
        let entries = match fs::read_dir(steam_root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(root = %steam_root.display(), error = %e, "Skipping search root");
                return Vec::new();
            }
        };

        let app_dir = self.app_id.to_string();
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let id = entry.file_name().to_str()?.to_string();
                if !is_account_id(&id) {
                    return None;
                }
                let root = entry.path().join(&app_dir);
                root.is_dir().then(|| AccountProfile {
                    id,
                    root,
                    steam_root: steam_root.to_path_buf(),
                })
            })
            .collect()
    }
}

/// Numeric, non-zero account directory names. `0` is Steam's anonymous user.
fn is_account_id(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) && name.bytes().any(|b| b != b'0')
}

fn account_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
