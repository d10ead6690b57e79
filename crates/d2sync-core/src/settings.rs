//! Injectable configuration for discovery and snapshotting
//!
//! Settings are loaded from `config.toml` (explicit path, or the per-user
//! config directory when present). Every field has a default, so an empty
//! file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Steam app id of Dota 2.
pub const DOTA2_APP_ID: u32 = 570;

/// Name of the per-destination state directory (baseline, backups).
pub const STATE_DIR: &str = ".dota2-sync";

/// Patterns excluded from snapshots unless overridden.
pub const DEFAULT_IGNORE: &[&str] = &["**/*.lock", "**/*.tmp", "**/cache/**", "**/.DS_Store"];

const DEFAULT_WORKERS: usize = 4;

/// Runtime settings for a sync invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Steam `userdata` directories to scan. Empty means platform defaults.
    pub steam_roots: Vec<PathBuf>,
    /// App directory inside each account (`userdata/<id>/<app_id>`).
    pub app_id: u32,
    /// Glob patterns (relative to the profile root) excluded from snapshots.
    pub ignore: Vec<String>,
    /// Worker threads used for hashing within one profile.
    pub workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            steam_roots: Vec::new(),
            app_id: DOTA2_APP_ID,
            ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
            workers: DEFAULT_WORKERS,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let settings: Settings = toml::from_str(&content).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate(path)?;
        Ok(settings)
    }

    /// Load from `explicit` if given, otherwise from the default location if
    /// a file exists there, otherwise return defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "Loading settings");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/dota2-sync/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dota2-sync").join("config.toml"))
    }

    /// Replace the configured search roots (used for CLI overrides).
    pub fn with_steam_roots(mut self, roots: Vec<PathBuf>) -> Self {
        if !roots.is_empty() {
            self.steam_roots = roots;
        }
        self
    }

    /// Effective search roots: configured ones, or the platform defaults.
    pub fn search_roots(&self) -> Vec<PathBuf> {
        if self.steam_roots.is_empty() {
            default_steam_roots()
        } else {
            self.steam_roots.clone()
        }
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Settings {
                path: path.to_path_buf(),
                message: "workers must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Standard Steam `userdata` locations for the current platform.
pub fn default_steam_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    #[cfg(target_os = "macos")]
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join("Library/Application Support/Steam/userdata"));
    }

    #[cfg(target_os = "linux")]
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".local/share/Steam/userdata"));
        roots.push(home.join(".steam/steam/userdata"));
        roots.push(home.join(".var/app/com.valvesoftware.Steam/.local/share/Steam/userdata"));
    }

    #[cfg(target_os = "windows")]
    {
        roots.push(PathBuf::from(r"C:\Program Files (x86)\Steam\userdata"));
        roots.push(PathBuf::from(r"C:\Program Files\Steam\userdata"));
    }

    roots
}
