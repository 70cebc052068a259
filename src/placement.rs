use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::archive::SUBTITLE_EXTENSION;
use crate::temp::write_temp_file;

/// Highest duplicate number tried before giving up
const MAX_DUPLICATE_NUMBER: u32 = 9999;

/// Errors that can occur while placing a subtitle next to its video
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("Video path has no file name: {0}")]
    InvalidVideoPath(PathBuf),

    #[error("Invalid language code: {0:?}")]
    InvalidLanguage(String),

    #[error("Failed to write subtitle {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    #[error("No free subtitle name left for: {0}")]
    NoFreeName(PathBuf),
}

/// Sanitizes a string for use in filenames by replacing problematic characters
///
/// Replaces characters that are invalid or problematic in filenames across platforms:
/// - Path separators: / \
/// - Reserved characters: : * ? " < > |
/// - Control characters
/// - Trim leading/trailing whitespace and dots
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    // Trim whitespace and dots from start/end
    sanitized.trim_matches(|c: char| c.is_whitespace() || c == '.').to_string()
}

/// Builds the subtitle path for a video
///
/// `/media/movie.mkv` with language `he` becomes `/media/movie.he.srt`, and
/// with duplicate number 2 `/media/movie.he.2.srt`.
pub fn subtitle_path(
    video: &Path,
    language: &str,
    duplicate: Option<u32>,
) -> Result<PathBuf, PlacementError> {
    let stem = video
        .file_stem()
        .ok_or_else(|| PlacementError::InvalidVideoPath(video.to_path_buf()))?
        .to_string_lossy();

    let language_segment = sanitize_filename(language);
    if language_segment.is_empty() {
        return Err(PlacementError::InvalidLanguage(language.to_string()));
    }
    let language = language_segment;

    let filename = match duplicate {
        None => format!("{stem}.{language}{SUBTITLE_EXTENSION}"),
        Some(number) => format!("{stem}.{language}.{number}{SUBTITLE_EXTENSION}"),
    };

    Ok(video_dir(video).join(filename))
}

/// Directory holding the video; the current directory for bare filenames
fn video_dir(video: &Path) -> &Path {
    video
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

/// Writes a subtitle next to its video and returns the absolute path written
///
/// The subtitle is named `<video stem>.<language>.srt`. If that file exists
/// and `overwrite` is false, the lowest free duplicate number starting at 2
/// is used instead (`movie.he.2.srt`, `movie.he.3.srt`, ...). With
/// `overwrite` the existing file is replaced.
///
/// The content is written to a temporary file in the same directory first
/// and then linked or renamed into place, so a returned path always holds the
/// complete content and a failed write leaves no partial subtitle behind.
/// Claiming a name is exclusive: two concurrent placements for the same video
/// never end up on the same duplicate number.
pub fn place_subtitle(
    video: &Path,
    content: &[u8],
    language: &str,
    overwrite: bool,
) -> Result<PathBuf, PlacementError> {
    let base_path = subtitle_path(video, language, None)?;
    let dir = std::path::absolute(video_dir(video)).map_err(|e| PlacementError::WriteFailed {
        path: base_path.clone(),
        source: e,
    })?;

    let temp = write_temp_file(&dir, "subtitle", content).map_err(|e| {
        PlacementError::WriteFailed {
            path: dir.clone(),
            source: e,
        }
    })?;

    if overwrite {
        let target = dir.join(file_name_of(&base_path));
        fs::rename(temp.path(), &target).map_err(|e| PlacementError::WriteFailed {
            path: target.clone(),
            source: e,
        })?;
        return Ok(target);
    }

    let candidates = std::iter::once(None).chain((2..=MAX_DUPLICATE_NUMBER).map(Some));
    for duplicate in candidates {
        let target = dir.join(file_name_of(&subtitle_path(video, language, duplicate)?));

        match link_into_place(temp.path(), &target, content) {
            Ok(()) => return Ok(target),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(PlacementError::WriteFailed {
                    path: target,
                    source: e,
                });
            }
        }
    }

    Err(PlacementError::NoFreeName(base_path))
}

fn file_name_of(path: &Path) -> &std::ffi::OsStr {
    // subtitle_path always produces a file name
    path.file_name().unwrap_or_default()
}

/// Makes `target` hold the temporary file's content, failing with
/// `AlreadyExists` if `target` is taken
///
/// Falls back to an exclusive create and write on filesystems without hard
/// links.
fn link_into_place(temp: &Path, target: &Path, content: &[u8]) -> io::Result<()> {
    match fs::hard_link(temp, target) {
        Err(e) if e.kind() != io::ErrorKind::AlreadyExists => write_exclusive(target, content),
        result => result,
    }
}

fn write_exclusive(target: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)?;

    if let Err(e) = file.write_all(content).and_then(|()| file.sync_all()) {
        let _ = fs::remove_file(target);
        return Err(e);
    }

    Ok(())
}
