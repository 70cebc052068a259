//! Temporary file management module
//!
//! This module provides RAII-based temporary file handling with automatic cleanup.
//! Subtitles are first written to a temporary file next to their final location
//! and only then linked or renamed into place.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Guard for a temporary file that is deleted when dropped
#[derive(Debug)]
pub(crate) struct TempFile {
    path: PathBuf,
}

impl TempFile {
    /// Get the path to the temporary file
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        // Silently ignore errors during cleanup; the file may have been renamed away
        let _ = fs::remove_file(&self.path);
    }
}

impl Deref for TempFile {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.path()
    }
}

/// Writes `content` to a new hidden temporary file in `dir`
///
/// The filename is made unique with a ULID (monotonic, sortable unique
/// identifier). The content is flushed to disk before the guard is returned;
/// on any error the partially written file is removed.
///
/// # Examples
///
/// ```ignore
/// let temp = write_temp_file(Path::new("/media/movies"), "subtitle", b"...")?;
/// fs::rename(temp.path(), "/media/movies/movie.he.srt")?;
/// ```
pub(crate) fn write_temp_file(dir: &Path, prefix: &str, content: &[u8]) -> io::Result<TempFile> {
    let ulid = ulid::Ulid::new();
    let filename = format!(".{}_{}.tmp", prefix, ulid);

    let path = dir.join(filename);

    let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    let guard = TempFile { path };
    file.write_all(content)?;
    file.sync_all()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let temp = write_temp_file(dir.path(), "test", b"content").unwrap();
        let path = temp.path().to_path_buf();

        // File should exist with the content
        assert!(path.is_file());
        assert_eq!(fs::read(&path).unwrap(), b"content");

        // Filename should contain prefix and extension
        let filename = path.file_name().unwrap().to_str().unwrap();
        assert!(filename.starts_with(".test_"));
        assert!(filename.ends_with(".tmp"));
        assert_eq!(path.parent(), Some(dir.path()));

        // Drop the guard
        drop(temp);

        // File should be cleaned up
        assert!(!path.exists());
    }

    #[test]
    fn test_multiple_temp_files_unique() {
        let dir = tempfile::tempdir().unwrap();
        let temp1 = write_temp_file(dir.path(), "test", b"1").unwrap();
        let temp2 = write_temp_file(dir.path(), "test", b"2").unwrap();

        assert_ne!(temp1.path(), temp2.path());
        assert!(temp1.exists());
        assert!(temp2.exists());
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_temp_file(&dir.path().join("missing"), "test", b"1");
        assert!(result.is_err());
    }
}
