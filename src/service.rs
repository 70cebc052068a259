//! Search, download and placement of subtitles
//!
//! [`SubtitleService`] ties the components together: it resolves the IMDb id
//! to query, searches the catalog, ranks the results by filename similarity,
//! downloads and extracts the chosen subtitle and writes it next to the video.

use crate::WizdomError;
use crate::archive::{ArchiveError, ExtractedFile, extract_subtitle};
use crate::cancellation::CancellationToken;
use crate::catalog::{
    CatalogError, CatalogQuery, EpisodeNumber, SubtitleCatalog, search_or_empty,
};
use crate::config::Config;
use crate::handle::{SubtitleHandle, primary_subtag};
use crate::placement::place_subtitle;
use crate::ranking::{rank_by_similarity, reference_name};
use crate::resolver::{MediaKind, ResolveRequest, SeriesLibrary, resolve_external_id};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What to search subtitles for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Movie or episode
    pub kind: MediaKind,
    /// IMDb id the host knows for the media itself
    pub imdb_id: String,
    /// Season number, required for episodes
    pub season: Option<u32>,
    /// Episode number, required for episodes
    pub episode: Option<u32>,
    /// Name of the series, used to resolve the series IMDb id
    pub series_name: Option<String>,
    /// Path of the media file, used to resolve the series IMDb id
    pub media_path: Option<PathBuf>,
    /// Local filename the results are ranked against
    pub reference_filename: Option<String>,
    /// Subtitle language; the first preferred language if absent
    pub language: Option<String>,
}

impl SearchCriteria {
    /// Criteria for a movie
    pub fn movie(imdb_id: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Movie,
            imdb_id: imdb_id.into(),
            season: None,
            episode: None,
            series_name: None,
            media_path: None,
            reference_filename: None,
            language: None,
        }
    }

    /// Criteria for a TV episode
    pub fn episode(imdb_id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            kind: MediaKind::Episode,
            season: Some(season),
            episode: Some(episode),
            ..Self::movie(imdb_id)
        }
    }

    pub fn with_series_name(mut self, series_name: impl Into<String>) -> Self {
        self.series_name = Some(series_name.into());
        self
    }

    pub fn with_media_path(mut self, media_path: impl Into<PathBuf>) -> Self {
        self.media_path = Some(media_path.into());
        self
    }

    pub fn with_reference_filename(mut self, filename: impl Into<String>) -> Self {
        self.reference_filename = Some(filename.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// The episode to query, checking that season and episode come together
    fn episode_number(&self) -> Result<Option<EpisodeNumber>, WizdomError> {
        if self.kind != MediaKind::Episode {
            return Ok(None);
        }

        match (self.season, self.episode) {
            (Some(season), Some(episode)) => Ok(Some(EpisodeNumber { season, episode })),
            _ => Err(WizdomError::MissingCriteria(format!(
                "season and episode numbers for episode {}",
                self.media_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| self.imdb_id.clone())
            ))),
        }
    }
}

/// A subtitle candidate returned by a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSubtitle {
    /// Wizdom subtitle id
    pub id: u64,
    /// Release name the subtitle was synced to, if known
    pub name: Option<String>,
    /// Handle to download this candidate later
    pub handle: SubtitleHandle,
}

impl CandidateSubtitle {
    /// Name to show to users
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Wizdom Subtitle #{}", self.id))
    }
}

/// A downloaded subtitle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitlePayload {
    /// Subtitle format, taken from the handle
    pub format: String,
    /// Language tag, taken from the handle
    pub language: String,
    /// Raw subtitle file content
    pub content: Vec<u8>,
    /// Wizdom does not flag forced subtitles; always false
    pub forced: bool,
    /// Wizdom does not flag SDH subtitles; always false
    pub hearing_impaired: bool,
}

/// Request to download the best subtitle for a video into its folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// What to search for
    pub criteria: SearchCriteria,
    /// The video the subtitle belongs to
    pub video_path: PathBuf,
    /// Replace an existing subtitle; the configured default if absent
    pub overwrite: Option<bool>,
}

/// Subtitle search and download for one catalog and library
#[derive(Debug)]
pub struct SubtitleService<C, L> {
    catalog: C,
    library: L,
    config: Config,
}

impl<C, L> SubtitleService<C, L>
where
    C: SubtitleCatalog,
    L: SeriesLibrary,
{
    pub fn new(catalog: C, library: L, config: Config) -> Self {
        Self {
            catalog,
            library,
            config,
        }
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the configuration, e.g. after the user edited it
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Searches subtitles for `criteria`
    ///
    /// Results are ranked by similarity to the reference filename when one is
    /// given, otherwise they keep the catalog's order. An empty list is a
    /// normal outcome; catalog failures are logged and also yield an empty
    /// list.
    pub fn search(
        &self,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> Result<Vec<CandidateSubtitle>, WizdomError> {
        info!(
            kind = ?criteria.kind,
            imdb = %criteria.imdb_id,
            series = criteria.series_name.as_deref().unwrap_or_default(),
            path = ?criteria.media_path,
            "Search request"
        );

        let own_id = criteria.imdb_id.trim();
        if own_id.is_empty() && criteria.kind != MediaKind::Episode {
            return Err(WizdomError::MissingCriteria("IMDb id".to_string()));
        }
        let episode = criteria.episode_number()?;

        // Episodes without an id of their own may still resolve to their series
        let mappings = self.config.series_mappings();
        let (imdb_id, _) = resolve_external_id(
            &ResolveRequest {
                kind: criteria.kind,
                own_id,
                series_name: criteria.series_name.as_deref(),
                media_path: criteria.media_path.as_deref(),
            },
            &self.library,
            &mappings,
        );
        if imdb_id.trim().is_empty() {
            return Err(WizdomError::MissingCriteria("IMDb id".to_string()));
        }

        let query = CatalogQuery { imdb_id, episode };
        let mut subtitles = search_or_empty(&self.catalog, &query, cancel)?;

        if let Some(filename) = criteria
            .reference_filename
            .as_deref()
            .filter(|f| !f.trim().is_empty())
        {
            rank_by_similarity(reference_name(filename), &mut subtitles, |s| {
                s.version_name.as_deref()
            });
        }

        let language = self.language_for(criteria);

        let candidates: Vec<CandidateSubtitle> = subtitles
            .into_iter()
            .map(|s| CandidateSubtitle {
                id: s.id,
                handle: SubtitleHandle::new(language, s.id),
                name: s.version_name,
            })
            .collect();

        info!(
            imdb = %query.imdb_id,
            count = candidates.len(),
            "Returning search results"
        );

        Ok(candidates)
    }

    /// Downloads the subtitle a handle from an earlier search points to
    ///
    /// Format and language of the payload come from the handle, not from the
    /// archive entry.
    pub fn download_by_handle(
        &self,
        handle: &str,
        cancel: &CancellationToken,
    ) -> Result<SubtitlePayload, WizdomError> {
        let handle: SubtitleHandle = handle.trim().parse()?;
        let extracted = self.fetch_subtitle(handle.id, cancel)?;

        Ok(SubtitlePayload {
            format: handle.format,
            language: handle.language,
            content: extracted.content,
            forced: false,
            hearing_impaired: false,
        })
    }

    /// Searches, downloads the best candidate and saves it next to the video
    ///
    /// Returns the path the subtitle was written to.
    pub fn download_to_file(
        &self,
        request: &DownloadRequest,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, WizdomError> {
        if !request.video_path.is_file() {
            return Err(WizdomError::VideoNotFound(request.video_path.clone()));
        }

        let mut criteria = request.criteria.clone();
        criteria
            .media_path
            .get_or_insert_with(|| request.video_path.clone());
        if criteria.reference_filename.is_none() {
            criteria.reference_filename = video_file_name(&request.video_path);
        }

        let candidates = self.search(&criteria, cancel)?;
        let Some(best) = candidates.first() else {
            warn!(imdb = %criteria.imdb_id, "No subtitles found");
            return Err(WizdomError::NoCandidates(criteria.imdb_id.clone()));
        };

        info!(
            id = best.id,
            name = %best.display_name(),
            "Downloading best matching subtitle"
        );
        let extracted = self.fetch_subtitle(best.id, cancel)?;

        let language = primary_subtag(self.language_for(&criteria));
        let overwrite = request.overwrite.unwrap_or(self.config.overwrite_existing);

        let path = place_subtitle(&request.video_path, &extracted.content, language, overwrite)?;
        info!(video = %request.video_path.display(), path = %path.display(), "Saved subtitle");

        Ok(path)
    }

    /// The requested language, or the first preferred one
    fn language_for<'c>(&'c self, criteria: &'c SearchCriteria) -> &'c str {
        criteria
            .language
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(self.config.default_language())
    }

    /// Downloads and extracts the archive of one subtitle
    fn fetch_subtitle(
        &self,
        id: u64,
        cancel: &CancellationToken,
    ) -> Result<ExtractedFile, WizdomError> {
        let archive = match self.catalog.fetch_archive(id, cancel) {
            Ok(archive) => archive,
            Err(CatalogError::Cancelled) => return Err(WizdomError::Cancelled),
            Err(source) => {
                error!(id, error = %source, "Wizdom subtitle download failed");
                return Err(WizdomError::DownloadFailed { id, source });
            }
        };

        match extract_subtitle(&archive, cancel) {
            Ok(extracted) => Ok(extracted),
            Err(ArchiveError::Cancelled) => Err(WizdomError::Cancelled),
            Err(ArchiveError::NoSubtitle) => Err(WizdomError::NoSubtitleInArchive(id)),
            Err(source) => {
                error!(id, error = %source, "Wizdom subtitle extraction failed");
                Err(WizdomError::ExtractionFailed { id, source })
            }
        }
    }
}

/// Reference filename for a video path: its file name
pub fn video_file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
