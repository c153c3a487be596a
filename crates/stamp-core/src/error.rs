//! Unified error handling for Stamp Core.
//!
//! Wraps domain and application errors behind one type with user-actionable
//! suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for Stamp Core operations.
#[derive(Debug, Error, Clone)]
pub enum StampError {
    /// Errors from the domain layer (business rule violations).
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (orchestration and I/O failures).
    #[error("{0}")]
    Application(#[from] ApplicationError),
}

impl StampError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Structure => ErrorCategory::Structure,
                crate::domain::ErrorCategory::Configuration => ErrorCategory::Configuration,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Structure,
    NotFound,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type StampResult<T> = Result<T, StampError>;
