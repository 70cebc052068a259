//! Library backed by the series listed in the configuration
//!
//! Outside a media server there is no library index to ask, so the CLI uses
//! the `[[library]]` entries of the configuration instead: each entry names a
//! series, the directory its episodes live in and its IMDb id.

use crate::config::LibrarySeries;
use crate::resolver::{LibraryError, SeriesLibrary, SeriesRecord};
use std::path::{Path, PathBuf};

/// A [`SeriesLibrary`] over a fixed list of series
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLibrary {
    series: Vec<LibrarySeries>,
}

impl ConfiguredLibrary {
    /// Creates a library from configuration entries
    pub fn new(series: Vec<LibrarySeries>) -> Self {
        Self { series }
    }

    fn record(entry: &LibrarySeries) -> SeriesRecord {
        SeriesRecord {
            name: entry.name.clone(),
            imdb_id: entry.imdb_id.clone(),
        }
    }
}

impl SeriesLibrary for ConfiguredLibrary {
    /// Finds the series whose directory contains `path`
    ///
    /// Relative paths are taken from the current directory. When directories
    /// are nested, the deepest one wins.
    fn find_series_by_path(&self, path: &Path) -> Result<Option<SeriesRecord>, LibraryError> {
        let path = absolute(path)?;

        Ok(self
            .series
            .iter()
            .filter(|entry| absolute(&entry.path).is_ok_and(|dir| path.starts_with(dir)))
            .max_by_key(|entry| entry.path.components().count())
            .map(Self::record))
    }

    fn find_series_by_name(&self, name: &str) -> Result<Option<SeriesRecord>, LibraryError> {
        Ok(self
            .series
            .iter()
            .find(|entry| entry.name == name)
            .map(Self::record))
    }
}

fn absolute(path: &Path) -> Result<PathBuf, LibraryError> {
    std::path::absolute(path)
        .map_err(|e| LibraryError(format!("Cannot resolve {}: {}", path.display(), e)))
}
