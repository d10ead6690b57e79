//! Glob-based ignore patterns
//!
//! Patterns are matched against the whole relative path: `*` stays within
//! one segment, `?` matches one character, `**` spans any number of
//! directories (including none). A pattern ending in `/**` also prunes the
//! matching directory from the walk.

use glob::{MatchOptions, Pattern};

use d2sync_fs::RelativePath;
use d2sync_fs::io::STAGING_SUFFIX;

use crate::settings::STATE_DIR;
use crate::{Error, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled set of ignore patterns.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<String>,
    files: Vec<Pattern>,
    /// `X` for every `X/**` pattern
    dirs: Vec<Pattern>,
}

impl IgnoreSet {
    /// Compile glob patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut set = Self::default();

        for pattern in patterns.iter().map(AsRef::as_ref) {
            if pattern.trim().is_empty() {
                return Err(invalid(pattern, "pattern is empty"));
            }
            set.files.push(compile(pattern)?);
            if let Some(dir) = pattern.strip_suffix("/**") {
                set.dirs.push(compile(dir)?);
            }
            set.patterns.push(pattern.to_string());
        }

        Ok(set)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether a file is excluded. The state directory and staging files are
    /// always excluded.
    pub fn is_ignored(&self, path: &RelativePath) -> bool {
        path.starts_with(STATE_DIR)
            || path.file_name().ends_with(STAGING_SUFFIX)
            || self
                .files
                .iter()
                .any(|p| p.matches_with(path.as_str(), MATCH_OPTIONS))
    }

    /// Whether a whole directory can be pruned from the walk.
    pub fn is_ignored_dir(&self, path: &RelativePath) -> bool {
        path.starts_with(STATE_DIR)
            || self
                .dirs
                .iter()
                .any(|p| p.matches_with(path.as_str(), MATCH_OPTIONS))
    }
}

fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(|e| invalid(pattern, e.msg))
}

fn invalid(pattern: &str, message: &str) -> Error {
    Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: message.to_string(),
    }
}
