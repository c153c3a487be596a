//! In-memory view of one target file during a generation pass.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::domain::{
    error::DomainError,
    marker::{MarkerRegion, MarkerSyntax, scan},
    merge::merge,
    report::FileState,
};

/// One file's text and the regions found in it.
///
/// Owned by exactly one file task and dropped at the end of the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDocument {
    path: PathBuf,
    text: String,
    regions: Vec<MarkerRegion>,
    state: FileState,
    rewritten: Vec<String>,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            regions: Vec::new(),
            state: FileState::Unscanned,
            rewritten: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn regions(&self) -> &[MarkerRegion] {
        &self.regions
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    /// Region ids whose interior the last merge changed.
    pub fn rewritten(&self) -> &[String] {
        &self.rewritten
    }

    pub fn region_ids(&self) -> HashSet<&str> {
        self.regions.iter().map(|r| r.id.as_str()).collect()
    }

    /// `Unscanned → Scanned`. A structural error moves the document to
    /// `Failed`.
    pub fn scan(&mut self, syntax: &MarkerSyntax) -> Result<(), DomainError> {
        match scan(&self.text, syntax) {
            Ok(regions) => {
                self.regions = regions;
                self.state = FileState::Scanned;
                Ok(())
            }
            Err(err) => {
                self.state = FileState::Failed;
                Err(err)
            }
        }
    }

    /// `Scanned → Merged`. Returns whether the text changed.
    pub fn merge(&mut self, content: &BTreeMap<String, String>) -> bool {
        let outcome = merge(&self.text, &self.regions, content);
        self.text = outcome.text;
        self.regions = outcome.regions;
        self.rewritten = outcome.rewritten;
        self.state = FileState::Merged;
        outcome.changed
    }

    pub fn mark_written(&mut self) {
        self.state = FileState::Written;
    }

    pub fn mark_unchanged(&mut self) {
        self.state = FileState::SkippedUnchanged;
    }

    pub fn mark_failed(&mut self) {
        self.state = FileState::Failed;
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
