//! Generation report.
//!
//! One [`GenerationReport`] is produced per orchestration run. It is assembled
//! by [`ReportBuilder`] after every file task has returned and is read-only
//! from then on.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Kind of a per-file (or per-sub-project) problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InvalidName,
    /// Sub-project shape problems (duplicate paths, bad unit scopes).
    InvalidSubProject,
    UnmatchedMarker,
    DuplicateMarkerId,
    UnknownRegionWarning,
    WriteFailure,
}

impl IssueKind {
    /// Warnings are recorded but do not fail a file.
    pub fn is_warning(self) -> bool {
        matches!(self, Self::UnknownRegionWarning)
    }

    /// Map a domain error raised while handling one file.
    pub fn from_domain(err: &DomainError) -> Self {
        match err {
            DomainError::InvalidName { .. } => Self::InvalidName,
            DomainError::UnmatchedMarker { .. } | DomainError::InvalidMarkerSyntax(_) => {
                Self::UnmatchedMarker
            }
            DomainError::DuplicateMarkerId { .. } => Self::DuplicateMarkerId,
            _ => Self::InvalidSubProject,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidName => "InvalidName",
            Self::InvalidSubProject => "InvalidSubProject",
            Self::UnmatchedMarker => "UnmatchedMarker",
            Self::DuplicateMarkerId => "DuplicateMarkerId",
            Self::UnknownRegionWarning => "UnknownRegionWarning",
            Self::WriteFailure => "WriteFailure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportIssue {
    pub path: PathBuf,
    pub kind: IssueKind,
    pub detail: String,
}

impl ReportIssue {
    pub fn new(path: impl Into<PathBuf>, kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ReportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.path.display(), self.kind, self.detail)
    }
}

/// Per-file lifecycle: `Unscanned → Scanned → Merged → terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Unscanned,
    Scanned,
    Merged,
    Written,
    SkippedUnchanged,
    Failed,
}

impl FileState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Written | Self::SkippedUnchanged | Self::Failed)
    }
}

/// Per-sub-project lifecycle: `Pending → Validating → Generating → terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubProjectState {
    Pending,
    Validating,
    Generating,
    Completed,
    Aborted,
}

impl fmt::Display for SubProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// What happened (or, in a dry run, would happen) to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Created,
    Updated,
    Unchanged,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    pub state: FileState,
    /// Region ids whose interior changed.
    pub rewritten_regions: Vec<String>,
    pub issues: Vec<ReportIssue>,
}

impl FileReport {
    pub fn new(path: impl Into<PathBuf>, outcome: FileOutcome, state: FileState) -> Self {
        Self {
            path: path.into(),
            outcome,
            state,
            rewritten_regions: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn failed(path: impl Into<PathBuf>, issue: ReportIssue) -> Self {
        let mut report = Self::new(path, FileOutcome::Failed, FileState::Failed);
        report.issues.push(issue);
        report
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubProjectSummary {
    pub name: String,
    pub root: PathBuf,
    pub state: SubProjectState,
    pub files: Vec<FileReport>,
    /// Issues not tied to one file: gate rejections, or units no file has
    /// a region for.
    pub issues: Vec<ReportIssue>,
}

impl SubProjectSummary {
    pub fn aborted(name: impl Into<String>, root: impl Into<PathBuf>, issue: ReportIssue) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            state: SubProjectState::Aborted,
            files: Vec::new(),
            issues: vec![issue],
        }
    }

    pub fn completed(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        files: Vec<FileReport>,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            state: SubProjectState::Completed,
            files,
            issues: Vec::new(),
        }
    }
}

/// Aggregated result of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    dry_run: bool,
    created: Vec<PathBuf>,
    updated: Vec<PathBuf>,
    unchanged: Vec<PathBuf>,
    errors: Vec<ReportIssue>,
    sub_projects: Vec<SubProjectSummary>,
}

impl GenerationReport {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn created(&self) -> &[PathBuf] {
        &self.created
    }

    pub fn updated(&self) -> &[PathBuf] {
        &self.updated
    }

    pub fn unchanged(&self) -> &[PathBuf] {
        &self.unchanged
    }

    /// Every recorded issue, warnings included, in declaration order.
    pub fn errors(&self) -> &[ReportIssue] {
        &self.errors
    }

    pub fn sub_projects(&self) -> &[SubProjectSummary] {
        &self.sub_projects
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ReportIssue> {
        self.errors.iter().filter(|i| i.kind.is_warning())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportIssue> {
        self.errors.iter().filter(|i| !i.kind.is_warning())
    }

    /// No failures. Warnings do not count.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Anything was (or, in a dry run, would be) created or updated.
    pub fn has_changes(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty()
    }

    pub fn file(&self, path: &Path) -> Option<&FileReport> {
        self.sub_projects
            .iter()
            .flat_map(|sp| sp.files.iter())
            .find(|f| f.path == path)
    }
}

/// Assembles a [`GenerationReport`] from sub-project summaries.
#[derive(Debug)]
pub struct ReportBuilder {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    dry_run: bool,
    sub_projects: Vec<SubProjectSummary>,
}

impl ReportBuilder {
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            dry_run,
            sub_projects: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn push(&mut self, summary: SubProjectSummary) {
        self.sub_projects.push(summary);
    }

    pub fn build(self) -> GenerationReport {
        let mut created = Vec::new();
        let mut updated = Vec::new();
        let mut unchanged = Vec::new();
        let mut errors = Vec::new();

        for sp in &self.sub_projects {
            errors.extend(sp.issues.iter().cloned());
            for file in &sp.files {
                match file.outcome {
                    FileOutcome::Created => created.push(file.path.clone()),
                    FileOutcome::Updated => updated.push(file.path.clone()),
                    FileOutcome::Unchanged => unchanged.push(file.path.clone()),
                    FileOutcome::Failed => {}
                }
                errors.extend(file.issues.iter().cloned());
            }
        }

        GenerationReport {
            run_id: self.run_id,
            started_at: self.started_at,
            dry_run: self.dry_run,
            created,
            updated,
            unchanged,
            errors,
            sub_projects: self.sub_projects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> GenerationReport {
        let mut builder = ReportBuilder::new(false);

        let mut app = FileReport::new("shell/src/App.jsx", FileOutcome::Updated, FileState::Written);
        app.issues.push(ReportIssue::new(
            "shell/src/App.jsx",
            IssueKind::UnknownRegionWarning,
            "unit 'Cart' targets missing region 'exports'",
        ));
        let index = FileReport::new("shell/src/index.js", FileOutcome::Unchanged, FileState::SkippedUnchanged);
        builder.push(SubProjectSummary::completed("shell", "shell", vec![app, index]));

        builder.push(SubProjectSummary::aborted(
            "Bad",
            "Bad",
            ReportIssue::new("Bad", IssueKind::InvalidName, "name can no longer contain capital letters"),
        ));

        builder.build()
    }

    #[test]
    fn aggregates_outcomes_in_declaration_order() {
        let report = report();
        assert_eq!(report.updated(), [PathBuf::from("shell/src/App.jsx")]);
        assert_eq!(report.unchanged(), [PathBuf::from("shell/src/index.js")]);
        assert!(report.created().is_empty());
        assert_eq!(report.errors().len(), 2);
        assert_eq!(report.errors()[0].kind, IssueKind::UnknownRegionWarning);
        assert_eq!(report.errors()[1].kind, IssueKind::InvalidName);
    }

    #[test]
    fn warnings_do_not_fail_the_run() {
        let mut builder = ReportBuilder::new(true);
        let mut file = FileReport::new("a.js", FileOutcome::Unchanged, FileState::SkippedUnchanged);
        file.issues.push(ReportIssue::new("a.js", IssueKind::UnknownRegionWarning, "x"));
        builder.push(SubProjectSummary::completed("a", "a", vec![file]));
        let report = builder.build();

        assert!(report.is_success());
        assert!(!report.has_changes());
        assert_eq!(report.warnings().count(), 1);
        assert!(report.is_dry_run());
    }

    #[test]
    fn failures_fail_the_run() {
        let report = report();
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.sub_projects()[1].state, SubProjectState::Aborted);
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["errors"][1]["kind"], "invalid_name");
        assert_eq!(json["sub_projects"][0]["state"], "completed");
        assert!(json["run_id"].is_string());
    }

    #[test]
    fn finds_file_reports_by_path() {
        let report = report();
        let file = report.file(Path::new("shell/src/App.jsx")).unwrap();
        assert_eq!(file.outcome, FileOutcome::Updated);
        assert!(FileState::Written.is_terminal());
        assert!(!FileState::Merged.is_terminal());
    }
}
