//! Error types for d2sync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from d2sync-core
    #[error(transparent)]
    Core(#[from] d2sync_core::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Execution stopped part way; the report was already printed
    #[error("{message}")]
    Partial { message: String },
}

impl CliError {
    /// Process exit code: 2 for usage problems, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(e) if e.is_usage() => 2,
            _ => 1,
        }
    }
}
