//! SHA-256 content digests
//!
//! A single canonical digest format (`sha256:<hex>`) used for file equality
//! and for the persisted baseline. Digests are compared for equality only.

use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Prefix for all digests produced by this module
const PREFIX: &str = "sha256:";

/// Fixed-width content digest in the form `sha256:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Compute the digest of in-memory content.
    pub fn of_bytes(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self(format!("{}{:x}", PREFIX, hasher.finalize()))
    }

    /// Compute the digest of a file's contents, streaming from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(Self(format!("{}{:x}", PREFIX, hasher.finalize())))
    }

    /// Get the canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for human-readable output (first 12 hex chars).
    pub fn short(&self) -> &str {
        let hex = self.0.strip_prefix(PREFIX).unwrap_or(&self.0);
        &hex[..hex.len().min(12)]
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
