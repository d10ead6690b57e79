//! Normalized profile-relative paths

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A path relative to a profile root, normalized to forward slashes.
///
/// Construction rejects absolute paths and `..` segments, and drops `.`
/// and empty segments, so two records naming the same file always compare
/// equal and no relative path can escape its root. Ordering is plain
/// lexicographic order on the normalized string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath {
    inner: String,
}

impl RelativePath {
    /// Parse and normalize a relative path string.
    ///
    /// Backslashes are treated as separators.
    pub fn new(path: impl AsRef<str>) -> Result<Self> {
        let raw = path.as_ref();
        let unified = raw.replace('\\', "/");

        if unified.starts_with('/') || has_drive_prefix(&unified) {
            return Err(Error::invalid_path(raw, "path must be relative"));
        }

        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(Error::invalid_path(raw, "traversal segment '..'")),
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(Error::invalid_path(raw, "path is empty"));
        }

        Ok(Self {
            inner: segments.join("/"),
        })
    }

    /// Build a relative path from `path` stripped of `root`.
    ///
    /// Names that would not survive the round trip through [`Self::under`]
    /// (not UTF-8, or containing a backslash) are rejected.
    pub fn from_root(root: &Path, path: &Path) -> Result<Self> {
        let stripped = path.strip_prefix(root).map_err(|_| {
            Error::invalid_path(
                path.to_string_lossy(),
                format!("not under root {}", root.display()),
            )
        })?;

        let mut parts = Vec::new();
        for component in stripped.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        Error::invalid_path(stripped.to_string_lossy(), "name is not valid UTF-8")
                    })?;
                    if part.contains('\\') {
                        return Err(Error::invalid_path(part, "backslash in file name"));
                    }
                    parts.push(part);
                }
                Component::CurDir => {}
                _ => {
                    return Err(Error::invalid_path(
                        stripped.to_string_lossy(),
                        "unexpected path component",
                    ));
                }
            }
        }

        Self::new(parts.join("/"))
    }

    /// Get the normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Resolve against a root directory into a platform-native path.
    pub fn under(&self, root: &Path) -> PathBuf {
        self.inner
            .split('/')
            .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
    }

    /// Get the final path segment.
    pub fn file_name(&self) -> &str {
        self.inner.rsplit('/').next().unwrap_or(&self.inner)
    }

    /// Whether this path lies inside the directory `prefix` (or equals it).
    pub fn starts_with(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches('/');
        self.inner == prefix
            || (self.inner.starts_with(prefix) && self.inner[prefix.len()..].starts_with('/'))
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RelativePath> for String {
    fn from(path: RelativePath) -> Self {
        path.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cfg/autoexec.cfg", "cfg/autoexec.cfg")]
    #[case("cfg\\video.txt", "cfg/video.txt")]
    #[case("./cfg//dotakeys_personal.lst", "cfg/dotakeys_personal.lst")]
    #[case("a/./b/", "a/b")]
    fn normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(RelativePath::new(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("/etc/passwd")]
    #[case("C:/Windows")]
    #[case("../outside")]
    #[case("cfg/../../escape")]
    #[case("")]
    #[case("./")]
    fn rejects(#[case] input: &str) {
        assert!(RelativePath::new(input).is_err(), "{input:?} should be rejected");
    }

    #[test]
    fn from_root_strips_prefix() {
        let root = Path::new("/steam/userdata/1/570");
        let full = root.join("remote").join("cfg").join("autoexec.cfg");
        let rel = RelativePath::from_root(root, &full).unwrap();
        assert_eq!(rel.as_str(), "remote/cfg/autoexec.cfg");
    }

    #[test]
    fn from_root_rejects_foreign_path() {
        let result = RelativePath::from_root(Path::new("/a"), Path::new("/b/file"));
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn from_root_rejects_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = Path::new("/steam/userdata/1/570");
        let first = root.join("cfg").join(OsStr::from_bytes(b"bind\xff.cfg"));
        let second = root.join("cfg").join(OsStr::from_bytes(b"bind\xfe.cfg"));

        for path in [first, second] {
            let err = RelativePath::from_root(root, &path).unwrap_err();
            assert!(matches!(err, Error::InvalidPath { .. }), "got: {err}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn from_root_rejects_backslash_names() {
        let root = Path::new("/steam/userdata/1/570");
        let path = root.join("cfg\\autoexec.cfg");
        assert!(RelativePath::from_root(root, &path).is_err());
    }

    #[test]
    fn under_joins_segments() {
        let rel = RelativePath::new("cfg/autoexec.cfg").unwrap();
        assert_eq!(
            rel.under(Path::new("/root")),
            Path::new("/root").join("cfg").join("autoexec.cfg")
        );
    }

    #[test]
    fn starts_with_matches_whole_segments() {
        let rel = RelativePath::new(".dota2-sync/baseline.toml").unwrap();
        assert!(rel.starts_with(".dota2-sync"));
        assert!(rel.starts_with(".dota2-sync/"));
        assert!(!rel.starts_with(".dota2"));
    }

    #[test]
    fn deserialize_validates() {
        let ok: RelativePath = serde_json::from_str("\"cfg/a.cfg\"").unwrap();
        assert_eq!(ok.file_name(), "a.cfg");
        let bad: std::result::Result<RelativePath, _> = serde_json::from_str("\"../a.cfg\"");
        assert!(bad.is_err());
    }
}
