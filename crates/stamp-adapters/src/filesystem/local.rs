//! Local filesystem adapter using std::fs and atomic rename.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use stamp_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{StampError, StampResult},
};

/// Production filesystem implementation.
///
/// Writes go to a temporary file in the target's directory, are flushed to
/// disk, then renamed over the target. A reader either sees the old content
/// or the new content, never a mix, and a failed write leaves the original
/// file as it was.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn read_to_string(&self, path: &Path) -> StampResult<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io_error(path, e, "read file")),
        }
    }

    fn write_atomic(&self, path: &Path, content: &str) -> StampResult<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        std::fs::create_dir_all(parent).map_err(|e| write_failure(path, e, "create directory"))?;

        let mut tmp =
            NamedTempFile::new_in(parent).map_err(|e| write_failure(path, e, "create temp file"))?;
        trace!(tmp = %tmp.path().display(), "staging write");

        tmp.write_all(content.as_bytes())
            .map_err(|e| write_failure(path, e, "write temp file"))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| write_failure(path, e, "sync temp file"))?;

        carry_permissions(path, &tmp)?;

        // Dropping the NamedTempFile on error removes the staged file.
        tmp.persist(path)
            .map_err(|e| write_failure(path, e.error, "replace file"))?;

        debug!(path = %path.display(), bytes = content.len(), "file committed");
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Temp files are created 0600; keep the target's mode, or use the usual
/// 0644 for new files.
fn carry_permissions(path: &Path, tmp: &NamedTempFile) -> StampResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let perms = match std::fs::metadata(path) {
            Ok(metadata) => metadata.permissions(),
            Err(_) => std::fs::Permissions::from_mode(0o644),
        };
        tmp.as_file()
            .set_permissions(perms)
            .map_err(|e| write_failure(path, e, "set permissions"))?;
    }
    #[cfg(not(unix))]
    {
        if let Ok(metadata) = std::fs::metadata(path) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| write_failure(path, e, "set permissions"))?;
        }
    }
    Ok(())
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> StampError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

fn write_failure(path: &Path, e: io::Error, operation: &str) -> StampError {
    ApplicationError::WriteFailure {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn missing_file_reads_as_none() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        assert_eq!(fs.read_to_string(&tmp.path().join("nope.js")).unwrap(), None);
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bin.dat");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = LocalFilesystem::new().read_to_string(&path).unwrap_err();
        assert!(err.to_string().contains("read file"));
    }

    #[test]
    fn write_creates_parents_and_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("src/components/App.jsx");
        let fs = LocalFilesystem::new();

        fs.write_atomic(&path, "one").unwrap();
        fs.write_atomic(&path, "two").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        assert_eq!(entries(&tmp.path().join("src/components")), vec!["App.jsx"]);
    }

    #[test]
    fn failed_write_leaves_original_untouched() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), "original").unwrap();

        // Renaming a file over a non-empty directory fails on every platform.
        let err = LocalFilesystem::new()
            .write_atomic(&target, "new content")
            .unwrap_err();

        assert!(matches!(
            err,
            StampError::Application(ApplicationError::WriteFailure { .. })
        ));
        assert_eq!(
            std::fs::read_to_string(target.join("keep.txt")).unwrap(),
            "original"
        );
        assert_eq!(entries(tmp.path()), vec!["target"]);
    }

    #[cfg(unix)]
    #[test]
    fn keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("run.sh");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        LocalFilesystem::new()
            .write_atomic(&path, "#!/bin/sh\necho hi\n")
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn new_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.js");
        LocalFilesystem::new().write_atomic(&path, "x").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
