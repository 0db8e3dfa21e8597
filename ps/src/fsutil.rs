//! Filesystem helpers

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Temp file path used while replacing `path`
///
/// Lives in the same directory so the final rename never crosses filesystems.
/// The leading dot keeps it out of plan listings.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Replace `path` with `contents` via temp file + rename
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let temp_path = temp_path_for(path);
    debug!(path = %path.display(), bytes = contents.len(), "write_atomic: called");

    fs::write(&temp_path, contents).map_err(|e| StoreError::io(&temp_path, e))?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::io(path, e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let temp = temp_path_for(Path::new("/data/plans/demo.txt"));
        assert_eq!(temp, PathBuf::from("/data/plans/.demo.txt.tmp"));
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("record.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_write_atomic_missing_dir_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("record.json");

        let err = write_atomic(&path, b"data").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
