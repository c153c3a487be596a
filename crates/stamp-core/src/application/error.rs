//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not business
//! rules. Business rule violations are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Reading or inspecting a path failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// The atomic commit of new file content failed.
    #[error("Failed to write {path}: {reason}")]
    WriteFailure { path: PathBuf, reason: String },

    /// A required input (descriptor, template file) does not exist.
    #[error("{what} not found: {path}")]
    NotFound { what: &'static str, path: PathBuf },

    /// The worker pool could not be built.
    #[error("Failed to start worker pool: {reason}")]
    ThreadPool { reason: String },

    /// Shared state guarded by a lock was poisoned by a panicking writer.
    #[error("Internal lock poisoned")]
    LockPoisoned,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that the file is readable and valid UTF-8".into(),
            ],
            Self::WriteFailure { path, .. } => vec![
                format!("Failed to write: {}", path.display()),
                "Check that you have write permissions".into(),
                "The original file was left untouched".into(),
            ],
            Self::NotFound { what, path } => vec![
                format!("No {what} at {}", path.display()),
                "Try: stamp new <NAME> to create a starter descriptor".into(),
            ],
            Self::ThreadPool { .. } => vec![
                "Try a lower --jobs value".into(),
            ],
            Self::LockPoisoned => vec!["Re-run the command".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::FilesystemError { .. }
            | Self::WriteFailure { .. }
            | Self::ThreadPool { .. }
            | Self::LockPoisoned => ErrorCategory::Internal,
        }
    }
}
