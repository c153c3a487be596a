//! Descriptor loader.
//!
//! Parses a `stamp.toml` descriptor into domain [`SubProject`] values ready
//! for the generation service.
//!
//! # `stamp.toml` format
//!
//! ```toml
//! [markers]                          # optional; overrides configuration
//! start = "GENERATOR:START"
//! id    = "GENERATOR:ID:"
//! end   = "GENERATOR:END"
//!
//! [[remotes]]
//! name          = "checkout"
//! root          = "apps/checkout"    # default: the remote name; "." is
//!                                    # the descriptor's own directory
//! owned_regions = ["exports"]        # optional
//! template_dir  = "templates/remote" # optional: every file below is a target
//! builtin       = "mfe-remote"       # optional: built-in template set
//!
//! [[remotes.files]]                  # optional explicit targets
//! path     = "src/App.jsx"
//! template = "templates/App.jsx"     # relative to the descriptor, or
//! # builtin = "mfe-shell:src/App.jsx"
//!
//! [[remotes.units]]
//! kind   = "import"                  # import | usage | export | component | raw
//! region = "imports"
//! name   = "Cart"
//! file   = "src/App.jsx"             # optional scope
//! from   = "catalog"                 # optional import source
//! # text = "..."                     # required for kind = "raw"
//! ```
//!
//! # File resolution
//!
//! Target files are collected from the built-in set first, then
//! `template_dir`, then explicit `[[remotes.files]]`. A later entry with the
//! same path replaces the earlier one in place.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use stamp_core::{
    application::ApplicationError,
    domain::{
        DomainError, GenerationUnit, MarkerSyntax, RelativePath, SubProject, TargetFile,
        UnitRegistry,
    },
    error::StampResult,
};

use crate::builtin_templates::{builtin_file, find_set};

/// Default descriptor file name.
pub const DESCRIPTOR_FILE: &str = "stamp.toml";

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of a `stamp.toml` file.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct DescriptorManifest {
    pub markers: Option<MarkersSection>,
    #[serde(default)]
    pub remotes: Vec<RemoteEntry>,
}

/// `[markers]` section. Each token is optional.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MarkersSection {
    pub start: Option<String>,
    pub id: Option<String>,
    pub end: Option<String>,
}

impl MarkersSection {
    /// Apply these overrides on top of `base`.
    pub fn apply(&self, base: &MarkerSyntax) -> Result<MarkerSyntax, DomainError> {
        MarkerSyntax::new(
            self.start.as_deref().unwrap_or(base.start_token()),
            self.id.as_deref().unwrap_or(base.id_token()),
            self.end.as_deref().unwrap_or(base.end_token()),
        )
    }
}

/// One `[[remotes]]` entry.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RemoteEntry {
    pub name: String,
    pub root: Option<String>,
    #[serde(default)]
    pub owned_regions: Vec<String>,
    pub template_dir: Option<String>,
    pub builtin: Option<String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub units: Vec<UnitEntry>,
}

/// One `[[remotes.files]]` entry.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    pub path: String,
    pub template: Option<String>,
    /// `set:path` reference into a built-in template set.
    pub builtin: Option<String>,
}

/// One `[[remotes.units]]` entry.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct UnitEntry {
    pub kind: UnitKindEntry,
    pub region: String,
    pub name: Option<String>,
    pub file: Option<String>,
    pub text: Option<String>,
    pub from: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitKindEntry {
    Import,
    Usage,
    Export,
    Component,
    Raw,
}

// ── Loaded result ─────────────────────────────────────────────────────────────

/// A parsed descriptor.
#[derive(Debug, Clone)]
pub struct LoadedDescriptor {
    pub path: PathBuf,
    pub markers: Option<MarkersSection>,
    pub sub_projects: Vec<SubProject>,
}

impl LoadedDescriptor {
    /// The marker syntax to use: descriptor overrides on top of `base`.
    pub fn marker_syntax(&self, base: &MarkerSyntax) -> Result<MarkerSyntax, DomainError> {
        match &self.markers {
            Some(section) => section.apply(base),
            None => Ok(base.clone()),
        }
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads a [`LoadedDescriptor`] from disk.
///
/// Relative paths inside the descriptor (`root`, `template_dir`,
/// `template`) resolve against the descriptor's directory.
pub struct DescriptorLoader {
    path: PathBuf,
}

impl DescriptorLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// - [`ApplicationError::NotFound`] if the descriptor or a referenced
    ///   template is missing.
    /// - [`DomainError::InvalidDescriptor`] if it cannot be parsed or is
    ///   inconsistent.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> StampResult<LoadedDescriptor> {
        if !self.path.is_file() {
            return Err(ApplicationError::NotFound {
                what: "descriptor",
                path: self.path.clone(),
            }
            .into());
        }

        let raw = fs::read_to_string(&self.path).map_err(|e| ApplicationError::FilesystemError {
            path: self.path.clone(),
            reason: format!("Failed to read descriptor: {e}"),
        })?;

        let base_dir = self.path.parent().unwrap_or(Path::new(""));
        let mut loaded = parse_str(&raw, base_dir)?;
        loaded.path = self.path.clone();

        info!(
            sub_projects = loaded.sub_projects.len(),
            "descriptor loaded"
        );
        Ok(loaded)
    }
}

/// Parse descriptor text. `base_dir` anchors relative paths.
pub fn parse_str(raw: &str, base_dir: &Path) -> StampResult<LoadedDescriptor> {
    let manifest: DescriptorManifest = toml::from_str(raw)
        .map_err(|e| DomainError::InvalidDescriptor(format!("failed to parse: {e}")))?;

    if manifest.remotes.is_empty() {
        return Err(DomainError::InvalidDescriptor("no [[remotes]] declared".into()).into());
    }

    let sub_projects = manifest
        .remotes
        .iter()
        .map(|remote| build_sub_project(remote, base_dir))
        .collect::<StampResult<Vec<_>>>()?;

    Ok(LoadedDescriptor {
        path: base_dir.join(DESCRIPTOR_FILE),
        markers: manifest.markers,
        sub_projects,
    })
}

#[instrument(skip_all, fields(remote = %remote.name))]
fn build_sub_project(remote: &RemoteEntry, base_dir: &Path) -> StampResult<SubProject> {
    let root = match remote.root.as_deref() {
        Some("." | "") => base_dir.to_path_buf(),
        Some(root) => base_dir.join(root),
        None => base_dir.join(&remote.name),
    };
    let mut sub_project = SubProject::new(&remote.name, root);
    let mut registry = UnitRegistry::new();

    if let Some(set_name) = &remote.builtin {
        let set = find_set(set_name)?;
        for file in set.files {
            upsert(&mut sub_project.files, file);
        }
        for region in set.owned_regions {
            registry.own_region(region);
        }
    }

    if let Some(dir) = &remote.template_dir {
        for file in load_template_dir(&base_dir.join(dir))? {
            upsert(&mut sub_project.files, file);
        }
    }

    for entry in &remote.files {
        let file = resolve_file(remote, entry, base_dir)?;
        upsert(&mut sub_project.files, file);
    }

    for region in &remote.owned_regions {
        registry.own_region(region.clone());
    }

    for (index, entry) in remote.units.iter().enumerate() {
        registry.push(build_unit(remote, index, entry)?);
    }

    debug!(
        files = sub_project.files.len(),
        units = registry.units().len(),
        "remote resolved"
    );
    Ok(sub_project.with_registry(registry))
}

fn upsert(files: &mut Vec<TargetFile>, file: TargetFile) {
    match files.iter_mut().find(|f| f.path == file.path) {
        Some(existing) => *existing = file,
        None => files.push(file),
    }
}

fn resolve_file(remote: &RemoteEntry, entry: &FileEntry, base_dir: &Path) -> StampResult<TargetFile> {
    let path = RelativePath::try_new(entry.path.as_str())?;

    let template = match (&entry.template, &entry.builtin) {
        (Some(template), None) => {
            let source = base_dir.join(template);
            if !source.is_file() {
                return Err(ApplicationError::NotFound {
                    what: "template file",
                    path: source,
                }
                .into());
            }
            fs::read_to_string(&source).map_err(|e| ApplicationError::FilesystemError {
                path: source.clone(),
                reason: format!("Failed to read template: {e}"),
            })?
        }
        (None, Some(reference)) => builtin_file(reference)?,
        _ => {
            return Err(DomainError::InvalidDescriptor(format!(
                "remote '{}', file '{}': set exactly one of `template` or `builtin`",
                remote.name, entry.path
            ))
            .into());
        }
    };

    Ok(TargetFile::new(path, template))
}

fn build_unit(remote: &RemoteEntry, index: usize, entry: &UnitEntry) -> StampResult<GenerationUnit> {
    let invalid = |detail: &str| {
        DomainError::InvalidDescriptor(format!(
            "remote '{}', unit #{}: {detail}",
            remote.name,
            index + 1
        ))
    };

    let mut unit = if entry.kind == UnitKindEntry::Raw {
        let text = entry
            .text
            .as_deref()
            .ok_or_else(|| invalid("kind = \"raw\" requires `text`"))?;
        GenerationUnit::raw(&entry.region, text)
    } else {
        if entry.text.is_some() {
            return Err(invalid("`text` is only allowed for kind = \"raw\"").into());
        }
        let name = entry
            .name
            .as_deref()
            .ok_or_else(|| invalid("`name` is required"))?;
        match entry.kind {
            UnitKindEntry::Import => GenerationUnit::import(&entry.region, name),
            UnitKindEntry::Usage => GenerationUnit::usage(&entry.region, name),
            UnitKindEntry::Export => GenerationUnit::export(&entry.region, name),
            UnitKindEntry::Component | UnitKindEntry::Raw => {
                GenerationUnit::component(&entry.region, name)
            }
        }
    };

    if let Some(file) = &entry.file {
        unit = unit.in_file(RelativePath::try_new(file.as_str())?);
    }
    if let Some(from) = &entry.from {
        unit = unit.from_remote(from);
    }
    Ok(unit)
}

/// Every regular file below `dir`, as target files keyed by their path
/// relative to `dir`. Entries are sorted by path.
pub fn load_template_dir(dir: &Path) -> StampResult<Vec<TargetFile>> {
    if !dir.is_dir() {
        return Err(ApplicationError::NotFound {
            what: "template directory",
            path: dir.to_path_buf(),
        }
        .into());
    }

    let mut files = Vec::new();
    for walk_entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let walk_entry = walk_entry.map_err(|e| ApplicationError::FilesystemError {
            path: dir.to_path_buf(),
            reason: format!("directory walk error: {e}"),
        })?;
        if !walk_entry.file_type().is_file() {
            continue;
        }

        let abs_path = walk_entry.path();
        let rel = abs_path
            .strip_prefix(dir)
            .map_err(|_| ApplicationError::FilesystemError {
                path: abs_path.to_path_buf(),
                reason: format!("not below '{}'", dir.display()),
            })?;

        let template =
            fs::read_to_string(abs_path).map_err(|e| ApplicationError::FilesystemError {
                path: abs_path.to_path_buf(),
                reason: format!("Failed to read template: {e}"),
            })?;

        files.push(TargetFile::new(
            RelativePath::try_new(normalize_path(&rel.to_string_lossy()))?,
            template,
        ));
    }

    debug!(dir = %dir.display(), count = files.len(), "template directory loaded");
    Ok(files)
}

/// Forward slashes on every platform.
fn normalize_path(raw: &str) -> String {
    raw.replace('\\', "/")
}
