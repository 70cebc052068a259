//! Series identifier resolution
//!
//! Hosts usually hand us the IMDb id of the episode itself, while Wizdom only
//! knows series-level ids. This module maps an episode's id to the id of its
//! series by consulting, in order, the local library (by path, then by name)
//! and the manual mappings from the configuration. When nothing matches, the
//! episode's own id is used as a last resort.

use crate::config::SeriesMappings;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Kind of media a subtitle is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// A feature film
    Movie,
    /// A single episode of a TV series
    Episode,
}

/// Error reported by a library lookup
///
/// The resolver never propagates these; a failing lookup counts as a miss.
#[derive(Debug, Error)]
#[error("Library lookup failed: {0}")]
pub struct LibraryError(pub String);

/// A series entry found in the local library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRecord {
    /// Series name
    pub name: String,
    /// IMDb id of the series, if the library knows it
    pub imdb_id: Option<String>,
}

impl SeriesRecord {
    /// The series' IMDb id, if present and not blank
    pub fn external_id(&self) -> Option<&str> {
        self.imdb_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Read access to the host's media library
pub trait SeriesLibrary {
    /// Finds the series that owns the episode file at `path`
    fn find_series_by_path(&self, path: &Path) -> Result<Option<SeriesRecord>, LibraryError>;

    /// Finds the first series whose name equals `name`
    fn find_series_by_name(&self, name: &str) -> Result<Option<SeriesRecord>, LibraryError>;
}

/// Input for one resolution
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    /// Kind of media being looked up
    pub kind: MediaKind,
    /// The id the host supplied for the media itself
    pub own_id: &'a str,
    /// Name of the owning series, for episodes
    pub series_name: Option<&'a str>,
    /// Path of the media file
    pub media_path: Option<&'a Path>,
}

/// Which rule produced the resolved id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Not an episode, the own id identifies the movie
    OwnId,
    /// Series found in the library by the episode's path
    LibraryPath,
    /// Series found in the library by its name
    LibraryName,
    /// Manual mapping from the configuration
    Mapping,
    /// Nothing matched, the episode id is used as is
    Fallback,
}

/// Resolves the catalog id to query for `request`
///
/// Returns the id together with the rule that produced it. Never fails.
pub fn resolve_external_id<L>(
    request: &ResolveRequest<'_>,
    library: &L,
    mappings: &SeriesMappings,
) -> (String, Resolution)
where
    L: SeriesLibrary + ?Sized,
{
    if request.kind != MediaKind::Episode {
        return (request.own_id.to_string(), Resolution::OwnId);
    }

    let series_name = request
        .series_name
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let resolved = request
        .media_path
        .and_then(|path| by_library_path(library, path))
        .map(|id| (id, Resolution::LibraryPath))
        .or_else(|| {
            series_name
                .and_then(|name| by_library_name(library, name))
                .map(|id| (id, Resolution::LibraryName))
        })
        .or_else(|| {
            series_name
                .and_then(|name| by_mapping(mappings, name))
                .map(|id| (id, Resolution::Mapping))
        });

    match resolved {
        Some((id, how)) => {
            info!(
                series = series_name.unwrap_or_default(),
                episode_id = request.own_id,
                series_id = %id,
                resolution = ?how,
                "Resolved series IMDb id"
            );
            (id, how)
        }
        None => {
            warn!(
                series = series_name.unwrap_or_default(),
                episode_id = request.own_id,
                "No series IMDb id found, using the episode id which may not return results"
            );
            (request.own_id.to_string(), Resolution::Fallback)
        }
    }
}

/// Tier 1: the series owning the episode file
fn by_library_path<L>(library: &L, path: &Path) -> Option<String>
where
    L: SeriesLibrary + ?Sized,
{
    match library.find_series_by_path(path) {
        Ok(series) => series.and_then(|s| s.external_id().map(str::to_string)),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Library path lookup failed");
            None
        }
    }
}

/// Tier 2: the first library series with the given name
fn by_library_name<L>(library: &L, name: &str) -> Option<String>
where
    L: SeriesLibrary + ?Sized,
{
    match library.find_series_by_name(name) {
        Ok(series) => series.and_then(|s| s.external_id().map(str::to_string)),
        Err(e) => {
            debug!(series = name, error = %e, "Library name lookup failed");
            None
        }
    }
}

/// Tier 3: manual mapping from the configuration
fn by_mapping(mappings: &SeriesMappings, name: &str) -> Option<String> {
    mappings.get(name).map(str::to_string)
}

/// A library that knows nothing; every lookup misses
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLibrary;

impl SeriesLibrary for EmptyLibrary {
    fn find_series_by_path(&self, _path: &Path) -> Result<Option<SeriesRecord>, LibraryError> {
        Ok(None)
    }

    fn find_series_by_name(&self, _name: &str) -> Result<Option<SeriesRecord>, LibraryError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Library stub with fixed answers per lookup kind
    struct StubLibrary {
        by_path: Result<Option<SeriesRecord>, ()>,
        by_name: Result<Option<SeriesRecord>, ()>,
    }

    impl StubLibrary {
        fn series(id: Option<&str>) -> Option<SeriesRecord> {
            Some(SeriesRecord {
                name: "Show".to_string(),
                imdb_id: id.map(str::to_string),
            })
        }
    }

    impl SeriesLibrary for StubLibrary {
        fn find_series_by_path(&self, _path: &Path) -> Result<Option<SeriesRecord>, LibraryError> {
            self.by_path
                .clone()
                .map_err(|_| LibraryError("path index unavailable".to_string()))
        }

        fn find_series_by_name(&self, _name: &str) -> Result<Option<SeriesRecord>, LibraryError> {
            self.by_name
                .clone()
                .map_err(|_| LibraryError("name index unavailable".to_string()))
        }
    }

    fn episode<'a>(series_name: Option<&'a str>) -> ResolveRequest<'a> {
        ResolveRequest {
            kind: MediaKind::Episode,
            own_id: "tt2313681",
            series_name,
            media_path: Some(Path::new("/media/tv/Show/S01E02.mkv")),
        }
    }

    #[test]
    fn test_movie_keeps_own_id() {
        let library = StubLibrary {
            by_path: Ok(StubLibrary::series(Some("tt0000001"))),
            by_name: Ok(StubLibrary::series(Some("tt0000002"))),
        };
        let request = ResolveRequest {
            kind: MediaKind::Movie,
            own_id: "tt0387808",
            series_name: Some("Show"),
            media_path: None,
        };
        let (id, how) = resolve_external_id(&request, &library, &SeriesMappings::default());
        assert_eq!(id, "tt0387808");
        assert_eq!(how, Resolution::OwnId);
    }

    #[test]
    fn test_path_tier_beats_name_tier() {
        let library = StubLibrary {
            by_path: Ok(StubLibrary::series(Some("tt1111111"))),
            by_name: Ok(StubLibrary::series(Some("tt2222222"))),
        };
        let (id, how) =
            resolve_external_id(&episode(Some("Show")), &library, &SeriesMappings::default());
        assert_eq!(id, "tt1111111");
        assert_eq!(how, Resolution::LibraryPath);
    }

    #[test]
    fn test_name_tier_when_path_has_no_id() {
        let library = StubLibrary {
            by_path: Ok(StubLibrary::series(None)),
            by_name: Ok(StubLibrary::series(Some("tt2222222"))),
        };
        let (id, how) =
            resolve_external_id(&episode(Some("Show")), &library, &SeriesMappings::default());
        assert_eq!(id, "tt2222222");
        assert_eq!(how, Resolution::LibraryName);
    }

    #[test]
    fn test_mapping_beats_own_id() {
        let mappings = SeriesMappings::parse("show:tt3333333");
        let (id, how) = resolve_external_id(&episode(Some("Show")), &EmptyLibrary, &mappings);
        assert_eq!(id, "tt3333333");
        assert_eq!(how, Resolution::Mapping);
    }

    #[test]
    fn test_library_errors_fall_through() {
        let library = StubLibrary {
            by_path: Err(()),
            by_name: Err(()),
        };
        let mappings = SeriesMappings::parse("Show:tt3333333");
        let (id, how) = resolve_external_id(&episode(Some("Show")), &library, &mappings);
        assert_eq!(id, "tt3333333");
        assert_eq!(how, Resolution::Mapping);
    }

    #[test]
    fn test_unknown_series_falls_back_to_own_id() {
        let (id, how) = resolve_external_id(
            &episode(Some("Unknown Show")),
            &EmptyLibrary,
            &SeriesMappings::default(),
        );
        assert_eq!(id, "tt2313681");
        assert_eq!(how, Resolution::Fallback);
    }

    #[test]
    fn test_blank_library_id_is_a_miss() {
        let library = StubLibrary {
            by_path: Ok(StubLibrary::series(Some("   "))),
            by_name: Ok(None),
        };
        let (id, how) = resolve_external_id(&episode(None), &library, &SeriesMappings::default());
        assert_eq!(id, "tt2313681");
        assert_eq!(how, Resolution::Fallback);
    }
}
