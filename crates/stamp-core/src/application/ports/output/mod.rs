//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `stamp-adapters` crate provides implementations.

use crate::error::StampResult;
use std::path::Path;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `stamp_adapters::filesystem::LocalFilesystem` (production, atomic writes)
/// - `stamp_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Implementations are shared across worker threads.
pub trait Filesystem: Send + Sync {
    /// Read a file as UTF-8. `Ok(None)` when the file does not exist.
    fn read_to_string(&self, path: &Path) -> StampResult<Option<String>>;

    /// Replace the file at `path` with `content` atomically.
    ///
    /// Parent directories are created as needed. On error the previous
    /// content (or absence) of `path` must be left as it was.
    fn write_atomic(&self, path: &Path, content: &str) -> StampResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;
}
