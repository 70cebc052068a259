//! Subtitle catalog access
//!
//! This module defines the data returned by a subtitle catalog and the trait
//! catalog clients implement. The Wizdom client is the only implementation.
mod wizdom;
mod wizdom_types;

pub use wizdom::WizdomCatalog;

use crate::cancellation::{CancellationToken, Cancelled};
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Errors that can occur while talking to the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to build the HTTP client
    #[error("Failed to create HTTP client: {0}")]
    ClientSetup(String),

    /// The request could not be sent or the response not be read
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// The catalog answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Failed to parse the catalog's JSON response
    #[error("Failed to parse catalog response: {0}")]
    ParseError(String),

    /// The request was cancelled by the caller
    #[error("Catalog request cancelled")]
    Cancelled,
}

/// Season and episode numbers of a TV episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpisodeNumber {
    /// Season number (0 for specials)
    pub season: u32,
    /// Episode number within the season
    pub episode: u32,
}

impl fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

/// A catalog search for one movie or episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// IMDb id of the movie or series
    pub imdb_id: String,
    /// Episode to search for; `None` for movies
    pub episode: Option<EpisodeNumber>,
}

impl CatalogQuery {
    /// Season number sent to the catalog (0 for movies)
    pub fn season_param(&self) -> u32 {
        self.episode.map(|e| e.season).unwrap_or(0)
    }

    /// Episode number sent to the catalog (0 for movies)
    pub fn episode_param(&self) -> u32 {
        self.episode.map(|e| e.episode).unwrap_or(0)
    }
}

/// One subtitle release as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSubtitle {
    /// Catalog-assigned subtitle id
    pub id: u64,
    /// Release name the subtitle was synced to, if known
    pub version_name: Option<String>,
}

/// Trait for subtitle catalogs
///
/// Both calls block until the catalog answers and return
/// [`CatalogError::Cancelled`] promptly once `cancel` fires.
pub trait SubtitleCatalog {
    /// Lists the subtitles available for a movie or episode
    fn search(
        &self,
        query: &CatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<CatalogSubtitle>, CatalogError>;

    /// Downloads the zip archive holding one subtitle
    fn fetch_archive(
        &self,
        subtitle_id: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, CatalogError>;
}

/// Searches the catalog, treating every failure except cancellation as
/// "no results"
///
/// Failures are logged here so callers only see an empty list.
pub fn search_or_empty<C>(
    catalog: &C,
    query: &CatalogQuery,
    cancel: &CancellationToken,
) -> Result<Vec<CatalogSubtitle>, Cancelled>
where
    C: SubtitleCatalog + ?Sized,
{
    match catalog.search(query, cancel) {
        Ok(subtitles) => Ok(subtitles),
        Err(CatalogError::Cancelled) => Err(Cancelled),
        Err(e) => {
            error!(
                imdb = %query.imdb_id,
                season = query.season_param(),
                episode = query.episode_param(),
                error = %e,
                "Wizdom search failed"
            );
            Ok(Vec::new())
        }
    }
}
