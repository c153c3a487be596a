//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use stamp_core::{
    application::{ApplicationError, ports::Filesystem},
    error::StampResult,
};

/// In-memory filesystem for testing.
///
/// Clones share the same storage, so a test can hand one clone to the
/// service and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    failing_writes: HashSet<PathBuf>,
    unreadable: HashSet<PathBuf>,
    writes: usize,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file (testing helper).
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.files.insert(path.into(), content.into());
        }
        self
    }

    /// Make every write to `path` fail.
    pub fn fail_writes_to(self, path: impl Into<PathBuf>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.failing_writes.insert(path.into());
        }
        self
    }

    /// Make every read of `path` fail.
    pub fn fail_reads_of(self, path: impl Into<PathBuf>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.unreadable.insert(path.into());
        }
        self
    }

    /// Read a file's content (testing helper).
    pub fn read_file(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path).cloned()
    }

    /// List all files, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.read().map(|inner| inner.writes).unwrap_or(0)
    }
}

impl Filesystem for MemoryFilesystem {
    fn read_to_string(&self, path: &Path) -> StampResult<Option<String>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::LockPoisoned)?;

        if inner.unreadable.contains(path) {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "Failed to read file: permission denied".into(),
            }
            .into());
        }
        Ok(inner.files.get(path).cloned())
    }

    fn write_atomic(&self, path: &Path, content: &str) -> StampResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::LockPoisoned)?;

        if inner.failing_writes.contains(path) {
            return Err(ApplicationError::WriteFailure {
                path: path.to_path_buf(),
                reason: "Failed to replace file: read-only file system".into(),
            }
            .into());
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| {
                inner.files.contains_key(path) || inner.files.keys().any(|f| f.starts_with(path))
            })
            .unwrap_or(false)
    }
}
