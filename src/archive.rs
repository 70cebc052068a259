//! Subtitle extraction from catalog archives
//!
//! Wizdom serves every subtitle as a zip archive. This module picks the entry
//! holding the subtitle and decompresses it into memory.

use crate::cancellation::CancellationToken;
use std::io::{self, Cursor, Read};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

/// File extension of the subtitle entry we look for
pub const SUBTITLE_EXTENSION: &str = ".srt";

/// Largest subtitle we are willing to decompress (16 MB)
const MAX_SUBTITLE_SIZE: usize = 16 * 1024 * 1024;

/// Errors that can occur while extracting a subtitle from an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The downloaded data is not a readable zip archive
    #[error("Invalid subtitle archive: {0}")]
    Corrupt(#[from] ZipError),

    /// Failed to decompress the selected entry
    #[error("Failed to decompress {entry}: {source}")]
    DecompressionFailed { entry: String, source: io::Error },

    /// The archive holds no file entries
    #[error("No SRT found in archive")]
    NoSubtitle,

    /// Extraction was cancelled by the caller
    #[error("Extraction cancelled")]
    Cancelled,
}

/// A file extracted from a subtitle archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Full name of the entry inside the archive
    pub name: String,
    /// Decompressed content
    pub content: Vec<u8>,
}

/// Extracts the subtitle file from a zip archive
///
/// The first entry whose name ends in `.srt` (ignoring case) is chosen. If
/// there is none, the first file entry is used instead. Directory entries are
/// never chosen.
pub fn extract_subtitle(
    archive: &[u8],
    cancel: &CancellationToken,
) -> Result<ExtractedFile, ArchiveError> {
    extract_with_limit(archive, cancel, MAX_SUBTITLE_SIZE)
}

/// Extracts the subtitle entry, failing once more than `limit` bytes come out
///
/// The size declared in the archive is not trusted; only the bytes actually
/// decompressed count.
fn extract_with_limit(
    archive: &[u8],
    cancel: &CancellationToken,
    limit: usize,
) -> Result<ExtractedFile, ArchiveError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let index = select_entry(&mut zip)?.ok_or(ArchiveError::NoSubtitle)?;

    let mut entry = zip.by_index(index)?;
    let name = entry.name().to_string();
    let mut content = Vec::new();
    let mut buffer = [0; 8192];

    loop {
        if cancel.is_cancelled() {
            return Err(ArchiveError::Cancelled);
        }

        let bytes_read = entry
            .read(&mut buffer)
            .map_err(|e| ArchiveError::DecompressionFailed {
                entry: name.clone(),
                source: e,
            })?;

        if bytes_read == 0 {
            break;
        }

        if content.len() + bytes_read > limit {
            return Err(ArchiveError::DecompressionFailed {
                entry: name,
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("entry exceeds {limit} bytes"),
                ),
            });
        }

        content.extend_from_slice(&buffer[..bytes_read]);
    }

    Ok(ExtractedFile { name, content })
}

/// Finds the index of the entry to extract, without decompressing anything
fn select_entry<R>(zip: &mut ZipArchive<R>) -> Result<Option<usize>, ArchiveError>
where
    R: io::Read + io::Seek,
{
    let mut first_file = None;

    for index in 0..zip.len() {
        let entry = zip.by_index_raw(index)?;
        if entry.is_dir() {
            continue;
        }

        if is_subtitle_name(entry.name()) {
            return Ok(Some(index));
        }

        first_file.get_or_insert(index);
    }

    Ok(first_file)
}

fn is_subtitle_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(SUBTITLE_EXTENSION)
}
