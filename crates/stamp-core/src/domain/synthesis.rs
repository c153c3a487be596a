//! Content synthesis for marker regions.
//!
//! A [`UnitRegistry`] holds the generation units of one sub-project in the
//! order they were declared. Rendering a region walks that list in order, so
//! the same registry always produces byte-identical text.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::domain::{entities::common::RelativePath, error::DomainError, marker::MarkerSyntax};

/// What a generation unit renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// `import Name from 'remote/Name';`
    Import,
    /// `<Name />`
    Usage,
    /// `export { default as Name } from './Name';`
    Export,
    /// `'./Name': './src/components/Name',` (an exposes entry)
    Component,
    /// Literal text, copied as-is.
    Raw(String),
}

impl UnitKind {
    /// Whether the unit's `name` ends up in generated code and therefore has
    /// to be a valid component identifier.
    pub fn renders_name(&self) -> bool {
        !matches!(self, Self::Raw(_))
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Usage => write!(f, "usage"),
            Self::Export => write!(f, "export"),
            Self::Component => write!(f, "component"),
            Self::Raw(_) => write!(f, "raw"),
        }
    }
}

/// One fragment to inject into a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationUnit {
    pub kind: UnitKind,
    /// Region id the unit targets.
    pub region: String,
    /// Component name (or a label, for raw units).
    pub name: String,
    /// Restrict the unit to one target file. `None` applies it everywhere.
    pub file: Option<RelativePath>,
    /// Module prefix for imports. Defaults to the owning sub-project, which
    /// is wrong for a shell importing from its remotes.
    pub from: Option<String>,
}

impl GenerationUnit {
    pub fn new(kind: UnitKind, region: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            region: region.into(),
            name: name.into(),
            file: None,
            from: None,
        }
    }

    pub fn import(region: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(UnitKind::Import, region, name)
    }

    pub fn usage(region: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(UnitKind::Usage, region, name)
    }

    pub fn export(region: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(UnitKind::Export, region, name)
    }

    pub fn component(region: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(UnitKind::Component, region, name)
    }

    pub fn raw(region: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let label = text.lines().next().unwrap_or_default().to_string();
        Self::new(UnitKind::Raw(text), region, label)
    }

    /// Scope the unit to a single file.
    pub fn in_file(mut self, file: RelativePath) -> Self {
        self.file = Some(file);
        self
    }

    /// Import from another sub-project.
    pub fn from_remote(mut self, remote: impl Into<String>) -> Self {
        self.from = Some(remote.into());
        self
    }

    /// Does this unit apply to `file`?
    pub fn applies_to(&self, file: &Path) -> bool {
        self.file.as_ref().is_none_or(|f| f.as_path() == file)
    }

    /// Render the unit for the given sub-project.
    pub fn render(&self, sub_project: &str) -> String {
        let name = &self.name;
        let module = self.from.as_deref().unwrap_or(sub_project);
        match &self.kind {
            UnitKind::Import => format!("import {name} from '{module}/{name}';"),
            UnitKind::Usage => format!("<{name} />"),
            UnitKind::Export => format!("export {{ default as {name} }} from './{name}';"),
            UnitKind::Component => format!("'./{name}': './src/components/{name}',"),
            UnitKind::Raw(text) => text.clone(),
        }
    }
}

/// Declared generation units of one sub-project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitRegistry {
    units: Vec<GenerationUnit>,
    owned_regions: Vec<String>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit. Declaration order is rendering order.
    pub fn push(&mut self, unit: GenerationUnit) {
        self.units.push(unit);
    }

    pub fn with_unit(mut self, unit: GenerationUnit) -> Self {
        self.push(unit);
        self
    }

    /// Mark a region id as owned even when no unit targets it, so its
    /// interior is cleared instead of passed through.
    pub fn own_region(&mut self, region: impl Into<String>) {
        let region = region.into();
        if !self.owned_regions.contains(&region) {
            self.owned_regions.push(region);
        }
    }

    pub fn with_owned_region(mut self, region: impl Into<String>) -> Self {
        self.own_region(region);
        self
    }

    pub fn units(&self) -> &[GenerationUnit] {
        &self.units
    }

    pub fn owned_regions(&self) -> &[String] {
        &self.owned_regions
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.owned_regions.is_empty()
    }

    /// Units applicable to `file`, in declaration order.
    pub fn units_for<'a>(&'a self, file: &'a Path) -> impl Iterator<Item = &'a GenerationUnit> {
        self.units.iter().filter(move |u| u.applies_to(file))
    }

    /// Synthesize the interior of `region` in `file`.
    ///
    /// Returns `None` when the registry does not recognise the region; the
    /// caller must then leave the region as it is.
    pub fn synthesize(&self, region: &str, file: &Path, sub_project: &str) -> Option<String> {
        let mut recognised = self.owned_regions.iter().any(|r| r == region);
        let mut parts = Vec::new();
        for unit in self.units_for(file).filter(|u| u.region == region) {
            recognised = true;
            parts.push(unit.render(sub_project));
        }
        recognised.then(|| parts.join("\n"))
    }

    /// Units that apply to `file` but target a region the file does not have.
    pub fn unplaced_units<'a>(
        &'a self,
        file: &'a Path,
        present: &HashSet<&str>,
    ) -> Vec<&'a GenerationUnit> {
        self.units_for(file)
            .filter(|u| !present.contains(u.region.as_str()))
            .collect()
    }

    /// Reject units whose rendered text carries a delimiter token. Merged
    /// into a file, it would change the marker structure the next scan sees.
    pub fn check_tokens(&self, syntax: &MarkerSyntax, sub_project: &str) -> Result<(), DomainError> {
        for unit in &self.units {
            if let Some(token) = syntax.token_in(&unit.render(sub_project)) {
                return Err(DomainError::InvalidUnit(format!(
                    "{} unit '{}' for region '{}' contains the marker token '{token}'",
                    unit.kind, unit.name, unit.region
                )));
            }
        }
        Ok(())
    }

    /// Structural checks that do not depend on naming rules.
    pub fn validate(&self) -> Result<(), DomainError> {
        for unit in &self.units {
            if unit.region.trim().is_empty() {
                return Err(DomainError::InvalidUnit(format!(
                    "{} unit '{}' has no target region",
                    unit.kind, unit.name
                )));
            }
            if unit.kind.renders_name() && unit.name.trim().is_empty() {
                return Err(DomainError::InvalidUnit(format!(
                    "{} unit for region '{}' has no name",
                    unit.kind, unit.region
                )));
            }
        }
        Ok(())
    }
}
