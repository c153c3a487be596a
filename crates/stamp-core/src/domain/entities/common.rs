use super::DomainError;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A path relative to a sub-project root.
///
/// Invariant: never absolute and never climbs out of the root with `..`.
/// Enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    /// Create a new relative path.
    ///
    /// # Panics
    /// Panics if path is absolute or escapes its root (use `try_new` for fallible).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        assert!(
            Self::check(&path).is_ok(),
            "RelativePath must stay below its root: {:?}",
            path
        );
        Self(path)
    }

    /// Fallible constructor.
    pub fn try_new(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        Self::check(&path)?;
        Ok(Self(path))
    }

    fn check(path: &Path) -> Result<(), DomainError> {
        if path.is_absolute() || path.has_root() {
            return Err(DomainError::AbsolutePathNotAllowed {
                path: path.display().to_string(),
            });
        }
        if path.as_os_str().is_empty() {
            return Err(DomainError::MissingRequiredField { field: "path" });
        }

        let mut depth: usize = 0;
        for component in path.components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::ParentDir => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        DomainError::PathEscapesRoot {
                            path: path.display().to_string(),
                        }
                    })?;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(DomainError::AbsolutePathNotAllowed {
                        path: path.display().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Join a segment, maintaining relative invariant.
    pub fn join(&self, segment: impl AsRef<Path>) -> Result<Self, DomainError> {
        Self::try_new(self.0.join(segment.as_ref()))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_new(s)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_relative_paths() {
        let path = RelativePath::try_new("src/components/Cart.jsx").unwrap();
        assert_eq!(path.as_path(), Path::new("src/components/Cart.jsx"));
        assert!(RelativePath::try_new("src/../index.js").is_ok());
    }

    #[test]
    fn rejects_absolute_and_escaping_paths() {
        assert!(matches!(
            RelativePath::try_new("/etc/passwd"),
            Err(DomainError::AbsolutePathNotAllowed { .. })
        ));
        assert!(matches!(
            RelativePath::try_new("../outside.js"),
            Err(DomainError::PathEscapesRoot { .. })
        ));
        assert!(matches!(
            RelativePath::try_new("src/../../outside.js"),
            Err(DomainError::PathEscapesRoot { .. })
        ));
        assert!(RelativePath::try_new("").is_err());
    }

    #[test]
    fn join_keeps_invariant() {
        let base = RelativePath::try_new("src").unwrap();
        assert!(base.join("App.jsx").is_ok());
        assert!(base.join("../../x").is_err());
    }
}
