//! Sub-project ("remote") aggregate.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{
    common::RelativePath,
    template::{RenderContext, TargetFile},
};
use crate::domain::{error::DomainError, synthesis::UnitRegistry};

/// One independently generated unit: its files and the units injected into
/// them.
///
/// Invariant (checked by [`SubProject::validate`]): file paths are unique and
/// every file-scoped unit names one of those files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubProject {
    pub name: String,
    /// Directory the file paths are relative to.
    pub root: PathBuf,
    pub files: Vec<TargetFile>,
    pub registry: UnitRegistry,
}

impl SubProject {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            files: Vec::new(),
            registry: UnitRegistry::new(),
        }
    }

    pub fn with_file(mut self, file: TargetFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_registry(mut self, registry: UnitRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Absolute (or cwd-relative) location of a target file.
    pub fn resolve(&self, path: &RelativePath) -> PathBuf {
        self.root.join(path.as_path())
    }

    pub fn render_context(&self) -> RenderContext {
        RenderContext::new(&self.name)
    }

    /// Template text with the project variables filled in.
    pub fn render_template(&self, file: &TargetFile) -> String {
        self.render_context().render(&file.template)
    }

    pub fn file(&self, path: &Path) -> Option<&TargetFile> {
        self.files.iter().find(|f| f.path.as_path() == path)
    }

    /// Structural validation. Naming rules live in the name validator.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::MissingRequiredField { field: "name" });
        }

        let mut seen = HashSet::new();
        for file in &self.files {
            if !seen.insert(file.path.as_path()) {
                return Err(DomainError::DuplicatePath {
                    path: file.path.to_string(),
                });
            }
        }

        self.registry.validate()?;

        for unit in self.registry.units() {
            let Some(scope) = &unit.file else {
                continue;
            };
            if !seen.contains(scope.as_path()) {
                return Err(DomainError::InvalidUnit(format!(
                    "{} unit '{}' is scoped to '{}', which is not a file of '{}'",
                    unit.kind, unit.name, scope, self.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::synthesis::GenerationUnit;

    fn file(path: &str, template: &str) -> TargetFile {
        TargetFile::new(RelativePath::new(path), template)
    }

    #[test]
    fn renders_templates_with_project_variables() {
        let sp = SubProject::new("product-list", "apps/product-list")
            .with_file(file("package.json", "{\"name\": \"{{PROJECT_NAME_KEBAB}}\"}"));
        assert_eq!(
            sp.render_template(&sp.files[0]),
            "{\"name\": \"product-list\"}"
        );
        assert_eq!(
            sp.resolve(&sp.files[0].path),
            PathBuf::from("apps/product-list/package.json")
        );
    }

    #[test]
    fn rejects_duplicate_paths() {
        let sp = SubProject::new("shell", "shell")
            .with_file(file("src/App.jsx", ""))
            .with_file(file("src/App.jsx", ""));
        assert!(matches!(
            sp.validate(),
            Err(DomainError::DuplicatePath { .. })
        ));
    }

    #[test]
    fn rejects_units_scoped_to_unknown_files() {
        let sp = SubProject::new("shell", "shell")
            .with_file(file("src/App.jsx", ""))
            .with_registry(UnitRegistry::new().with_unit(
                GenerationUnit::usage("usages", "Cart").in_file(RelativePath::new("src/Nope.jsx")),
            ));
        assert!(matches!(sp.validate(), Err(DomainError::InvalidUnit(_))));
    }

    #[test]
    fn accepts_well_formed_sub_project() {
        let sp = SubProject::new("shell", "shell")
            .with_file(file("src/App.jsx", ""))
            .with_registry(UnitRegistry::new().with_unit(
                GenerationUnit::usage("usages", "Cart").in_file(RelativePath::new("src/App.jsx")),
            ));
        assert!(sp.validate().is_ok());
        assert!(sp.file(Path::new("src/App.jsx")).is_some());
    }
}
