// ============================================================================
// domain/error.rs - DOMAIN ERROR TAXONOMY
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they are folded into reports and re-emitted by the CLI)
/// - Categorizable (for CLI display and exit codes)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Naming gate
    // ========================================================================
    #[error("Invalid name(s) for '{subject}': {}", render_problems(.errors, .warnings))]
    InvalidName {
        subject: String,
        errors: Vec<String>,
        warnings: Vec<String>,
    },

    // ========================================================================
    // Marker structure (per file)
    // ========================================================================
    #[error("Unmatched marker at line {line}: {detail}")]
    UnmatchedMarker { line: usize, detail: String },

    #[error("Duplicate marker id '{id}' at lines {first_line} and {second_line}")]
    DuplicateMarkerId {
        id: String,
        first_line: usize,
        second_line: usize,
    },

    #[error("Invalid marker syntax: {0}")]
    InvalidMarkerSyntax(String),

    // ========================================================================
    // Sub-project shape
    // ========================================================================
    #[error("Invalid generation unit: {0}")]
    InvalidUnit(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Duplicate target path in sub-project: {path}")]
    DuplicatePath { path: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Path escapes the sub-project root: {path}")]
    PathEscapesRoot { path: String },

    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },
}

fn render_problems(errors: &[String], warnings: &[String]) -> String {
    errors
        .iter()
        .map(|e| format!("error: {e}"))
        .chain(warnings.iter().map(|w| format!("warning: {w}")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidName {
                errors, warnings, ..
            } => {
                let mut out: Vec<String> = errors.iter().map(|e| format!("• {e}")).collect();
                out.extend(warnings.iter().map(|w| format!("• {w} (warning)")));
                out.push("Use lowercase, URL-safe names for remotes (e.g. checkout, product-list)".into());
                out.push("Use PascalCase identifiers for components (e.g. CartButton)".into());
                out
            }
            Self::UnmatchedMarker { .. } => vec![
                "Every GENERATOR:START marker needs exactly one GENERATOR:END after it".into(),
                "Regions cannot be nested".into(),
            ],
            Self::DuplicateMarkerId { id, .. } => vec![
                format!("Rename one of the '{id}' regions so ids are unique within the file"),
            ],
            Self::InvalidMarkerSyntax(_) => vec![
                "Marker tokens must be non-empty and must not contain one another".into(),
                "Check the [markers] section of your config or descriptor".into(),
            ],
            Self::InvalidDescriptor(msg) => vec![
                "Check your stamp.toml descriptor".into(),
                format!("Details: {msg}"),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidName { .. }
            | Self::InvalidUnit(_)
            | Self::InvalidDescriptor(_)
            | Self::DuplicatePath { .. }
            | Self::AbsolutePathNotAllowed { .. }
            | Self::PathEscapesRoot { .. }
            | Self::MissingRequiredField { .. } => ErrorCategory::Validation,
            Self::UnmatchedMarker { .. } | Self::DuplicateMarkerId { .. } => {
                ErrorCategory::Structure
            }
            Self::InvalidMarkerSyntax(_) => ErrorCategory::Configuration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Structure,
    Configuration,
    NotFound,
    Internal,
}
