// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Stamp.
//!
//! Pure logic: no filesystem, no threads, no logging sinks. Everything that
//! touches the outside world is reached through ports defined in the
//! application layer.
//!
//! - [`marker`]: find generator regions in text
//! - [`synthesis`]: decide what goes inside a region
//! - [`merge`]: splice synthesized text back in
//! - [`validation`]: the naming gate
//! - [`report`]: what a run produced
pub mod entities;
pub mod error;
pub mod marker;
pub mod merge;
pub mod report;
pub mod synthesis;
pub mod validation;

pub use entities::{
    FileDocument, RenderContext, SubProject, TargetFile,
    common::RelativePath,
    template::{to_kebab_case, to_pascal_case, to_snake_case},
};

pub use error::{DomainError, ErrorCategory};

pub use marker::{
    DEFAULT_END_TOKEN, DEFAULT_ID_TOKEN, DEFAULT_START_TOKEN, LineEnding, MarkerRegion,
    MarkerSyntax, RegionLayout, Segment, scan, segments,
};
pub use merge::{MergeOutcome, merge};
pub use report::{
    FileOutcome, FileReport, FileState, GenerationReport, IssueKind, ReportBuilder, ReportIssue,
    SubProjectState, SubProjectSummary,
};
pub use synthesis::{GenerationUnit, UnitKind, UnitRegistry};
pub use validation::{NameValidation, NameValidator};
