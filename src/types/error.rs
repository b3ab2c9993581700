//! Error types for syncplan

use std::path::PathBuf;
use thiserror::Error;

/// Error types for plan generation and execution
#[derive(Debug, Error)]
pub enum SyncError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or request
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure while walking a root; aborts generation
    #[error("Failed to scan {}: {source}", root.display())]
    Scan {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure reading two files for content comparison; aborts generation
    #[error("Failed to compare contents of {path}: {source}")]
    Compare {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Plan file has no content at all
    #[error("Plan file is empty: {}", path.display())]
    EmptyPlan { path: PathBuf },

    /// Malformed operation line; aborts the whole parse
    #[error("Invalid plan syntax at line {line_number}: malformed operation line: {line}")]
    Syntax { line_number: usize, line: String },

    /// Token-complete line whose alias is not recognized; aborts before execution
    #[error("Invalid operation alias at line {line_number}: {alias}")]
    UnknownAlias { line_number: usize, alias: String },

    /// Operation path would resolve outside the sync roots
    #[error("Unsafe path at line {line_number}: {path}")]
    UnsafePath { line_number: usize, path: String },

    /// Transfer primitive reported a failure
    #[error("Transfer failed: {} -> {}: {message}", from.display(), to.display())]
    Transfer {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },

    /// A conflicting copy could not be inspected while picking a winner
    #[error("Cannot resolve conflict for {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One plan operation failed; remaining operations were not run
    #[error("Failed to execute operation {alias} {path}: {source}")]
    Execution {
        alias: String,
        path: String,
        #[source]
        source: Box<SyncError>,
    },

    /// Interactive editor could not be found or exited unsuccessfully
    #[error("Editor error: {0}")]
    Editor(String),
}

impl SyncError {
    /// Name of the phase this error belongs to
    pub fn phase(&self) -> &'static str {
        match self {
            SyncError::Scan { .. } | SyncError::Compare { .. } => "generate",
            SyncError::EmptyPlan { .. } | SyncError::Syntax { .. } => "parse",
            SyncError::UnknownAlias { .. } | SyncError::UnsafePath { .. } => "validate",
            SyncError::Transfer { .. }
            | SyncError::Resolve { .. }
            | SyncError::Execution { .. } => "execute",
            SyncError::Config(_) | SyncError::Editor(_) => "config",
            SyncError::Io(_) => "io",
        }
    }

    /// Check if this error came from reading or validating a plan file
    pub fn is_plan_error(&self) -> bool {
        matches!(
            self,
            SyncError::EmptyPlan { .. }
                | SyncError::Syntax { .. }
                | SyncError::UnknownAlias { .. }
                | SyncError::UnsafePath { .. }
        )
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, SyncError::Config(_))
    }

    /// Plan line the error points at, if any
    pub fn line_number(&self) -> Option<usize> {
        match self {
            SyncError::Syntax { line_number, .. }
            | SyncError::UnknownAlias { line_number, .. }
            | SyncError::UnsafePath { line_number, .. } => Some(*line_number),
            _ => None,
        }
    }
}
