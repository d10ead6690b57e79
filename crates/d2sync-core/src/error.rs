//! Error types for d2sync-core

use std::path::PathBuf;

use crate::executor::ExecutionReport;

/// Result type for d2sync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in d2sync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No account profile exists under any search root
    #[error("No Steam account profiles found (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    /// The requested account is not among the discovered profiles
    #[error("Account '{id}' not found (available: {})", .available.join(", "))]
    ProfileNotFound { id: String, available: Vec<String> },

    /// Source and destination name the same profile
    #[error("Source and destination are the same account: {id}")]
    SameProfile { id: String },

    /// A file or directory could not be read while building a snapshot
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two records claim the same relative path within one snapshot
    #[error("Duplicate record for {path} in snapshot of {account}")]
    DuplicateRecord { account: String, path: String },

    /// One or more plan operations failed during execution
    #[error(
        "Sync stopped after a failure: {} committed, {} failed, {} not run",
        .report.committed().count(),
        .report.failed().count(),
        .report.not_run().count()
    )]
    PartialFailure { report: Box<ExecutionReport> },

    /// The persisted baseline could not be read or written
    #[error("Baseline error at {path}: {message}")]
    Baseline { path: PathBuf, message: String },

    /// The settings file is invalid
    #[error("Invalid settings in {path}: {message}")]
    Settings { path: PathBuf, message: String },

    /// An ignore pattern failed to compile
    #[error("Invalid ignore pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from d2sync-fs
    #[error(transparent)]
    Fs(#[from] d2sync_fs::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is caused by the invocation rather than the
    /// filesystem (unknown account, nothing discovered, same account twice).
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } | Self::SameProfile { .. }
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no search roots configured".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
