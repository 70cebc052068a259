//! WizdomSubs - Find and download Hebrew subtitles from Wizdom
//!
//! This library searches the Wizdom subtitle catalog by IMDb id, ranks the
//! available releases by how well they match the local video's filename and
//! saves the chosen subtitle next to the video without clobbering existing
//! subtitle files.
//!
//! # Examples
//!
//! ```no_run
//! use wizdom_subs::{
//!     CancellationToken, Config, ConfiguredLibrary, DownloadRequest, SearchCriteria,
//!     SubtitleService, WizdomCatalog,
//! };
//! use std::path::PathBuf;
//!
//! let config = Config::load().unwrap();
//! let catalog = WizdomCatalog::new(&config).unwrap();
//! let library = ConfiguredLibrary::new(config.library.clone());
//! let service = SubtitleService::new(catalog, library, config);
//!
//! let video = PathBuf::from("/media/tv/Dark/Dark.S01E01.1080p.WEB.mkv");
//! let request = DownloadRequest {
//!     criteria: SearchCriteria::episode("tt7305782", 1, 1)
//!         .with_series_name("Dark")
//!         .with_reference_filename("Dark.S01E01.1080p.WEB.mkv"),
//!     video_path: video,
//!     overwrite: None,
//! };
//!
//! let written = service
//!     .download_to_file(&request, &CancellationToken::new())
//!     .unwrap();
//! println!("Saved {}", written.display());
//! ```

pub mod adapters;
mod archive;
mod cancellation;
mod catalog;
mod config;
mod handle;
mod library;
mod placement;
mod ranking;
mod resolver;
mod service;
mod temp;

use std::path::PathBuf;
use thiserror::Error;

// Re-export error types
pub use archive::ArchiveError;
pub use cancellation::{CancellationToken, Cancelled};
pub use catalog::CatalogError;
pub use config::ConfigError;
pub use handle::HandleError;
pub use placement::PlacementError;
pub use resolver::LibraryError;

// Re-export the public API
pub use archive::{ExtractedFile, SUBTITLE_EXTENSION, extract_subtitle};
pub use catalog::{
    CatalogQuery, CatalogSubtitle, EpisodeNumber, SubtitleCatalog, WizdomCatalog, search_or_empty,
};
pub use config::{Config, LibrarySeries, SeriesMappings};
pub use handle::{SUBTITLE_FORMAT, SubtitleHandle};
pub use library::ConfiguredLibrary;
pub use placement::{place_subtitle, sanitize_filename, subtitle_path};
pub use ranking::{edit_distance, rank_by_similarity, reference_name};
pub use resolver::{
    EmptyLibrary, MediaKind, Resolution, ResolveRequest, SeriesLibrary, SeriesRecord,
    resolve_external_id,
};
pub use service::{
    CandidateSubtitle, DownloadRequest, SearchCriteria, SubtitlePayload, SubtitleService,
    video_file_name,
};

/// Broad category of a [`WizdomError`]
///
/// Callers use this to tell "nothing there" apart from "could not get it".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was incomplete or malformed
    Input,
    /// There was nothing to download
    NotFound,
    /// Talking to the catalog or unpacking its answer failed
    Transport,
    /// The caller cancelled the operation
    Cancelled,
    /// Writing the subtitle to disk failed
    FileSystem,
    /// The configuration could not be loaded
    Configuration,
}

/// Top-level error type for WizdomSubs operations
#[derive(Debug, Error)]
pub enum WizdomError {
    /// A required search criterion is missing
    #[error("Missing {0}")]
    MissingCriteria(String),

    /// A subtitle handle could not be parsed
    #[error("Invalid subtitle handle: {0}")]
    InvalidHandle(#[from] HandleError),

    /// The catalog has no subtitles for the request
    #[error("No subtitles found for {0}")]
    NoCandidates(String),

    /// The video to place a subtitle next to does not exist
    #[error("Video file not found: {0}")]
    VideoNotFound(PathBuf),

    /// The subtitle archive holds no files
    #[error("No subtitle found in archive of subtitle {0}")]
    NoSubtitleInArchive(u64),

    /// Downloading the subtitle archive failed
    #[error("Failed to download subtitle {id}: {source}")]
    DownloadFailed { id: u64, source: CatalogError },

    /// The subtitle archive could not be unpacked
    #[error("Failed to extract subtitle {id}: {source}")]
    ExtractionFailed { id: u64, source: ArchiveError },

    /// The operation was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Writing the subtitle file failed
    #[error("Failed to save subtitle: {0}")]
    Placement(#[from] PlacementError),

    /// Writing a fetched subtitle to a file or stdout failed
    #[error("Failed to write subtitle to {target}: {source}")]
    Output {
        target: String,
        source: std::io::Error,
    },

    /// Error while setting up the catalog client
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Error while loading the configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<Cancelled> for WizdomError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl WizdomError {
    /// The category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCriteria(_) | Self::InvalidHandle(_) => ErrorKind::Input,
            Self::NoCandidates(_) | Self::VideoNotFound(_) | Self::NoSubtitleInArchive(_) => {
                ErrorKind::NotFound
            }
            Self::DownloadFailed { .. } | Self::ExtractionFailed { .. } => ErrorKind::Transport,
            Self::Catalog(CatalogError::Cancelled) => ErrorKind::Cancelled,
            Self::Catalog(_) => ErrorKind::Transport,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Placement(PlacementError::InvalidVideoPath(_))
            | Self::Placement(PlacementError::InvalidLanguage(_)) => ErrorKind::Input,
            Self::Placement(_) | Self::Output { .. } => ErrorKind::FileSystem,
            Self::Config(_) => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            WizdomError::from(HandleError::InvalidFormat("x".to_string())).kind(),
            ErrorKind::Input
        );
        assert_eq!(WizdomError::from(Cancelled).kind(), ErrorKind::Cancelled);
        assert_eq!(WizdomError::NoSubtitleInArchive(1).kind(), ErrorKind::NotFound);
        assert_eq!(
            WizdomError::DownloadFailed {
                id: 1,
                source: CatalogError::HttpStatus {
                    url: "https://wizdom.xyz/api/files/sub/1".to_string(),
                    status: 503,
                },
            }
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            WizdomError::from(PlacementError::NoFreeName(PathBuf::from("movie.he.srt"))).kind(),
            ErrorKind::FileSystem
        );
        assert_eq!(
            WizdomError::Output {
                target: "<stdout>".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
            }
            .kind(),
            ErrorKind::FileSystem
        );
    }
}
