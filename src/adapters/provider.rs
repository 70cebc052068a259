//! Subtitle provider shape
//!
//! Media servers search all registered subtitle providers with one request
//! type and expect a flat list of results whose ids they hand back later to
//! download a subtitle. Failing searches must not break the server's search
//! across providers, so everything except cancellation turns into an empty
//! result here.

use crate::{ErrorKind, WizdomError};
use crate::cancellation::CancellationToken;
use crate::catalog::SubtitleCatalog;
use crate::handle::SUBTITLE_FORMAT;
use crate::resolver::{MediaKind, SeriesLibrary};
use crate::service::{SearchCriteria, SubtitlePayload, SubtitleService, video_file_name};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Name under which the provider is registered
pub const PROVIDER_NAME: &str = "WizdomSubs";

/// Search request as sent by the media server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleSearchRequest {
    /// Movie or episode; `None` for unsupported media
    pub content_type: Option<MediaKind>,
    /// IMDb id of the movie or episode
    pub imdb_id: Option<String>,
    /// Path of the media file
    pub media_path: Option<PathBuf>,
    /// Requested language tag, e.g. `heb`
    pub language: Option<String>,
    /// Series name for episodes
    pub series_name: Option<String>,
    /// Season number for episodes
    pub parent_index_number: Option<u32>,
    /// Episode number for episodes
    pub index_number: Option<u32>,
}

/// One search result in the shape the media server displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSubtitleInfo {
    /// Handle to pass to [`SubtitleProvider::get_subtitles`]
    pub id: String,
    pub name: String,
    pub provider_name: String,
    /// Language tag carried in the handle, e.g. `he` or `heb`
    pub language: String,
    pub format: String,
    pub is_hash_match: bool,
    pub comment: String,
}

/// The service in subtitle-provider shape
#[derive(Debug)]
pub struct SubtitleProvider<'a, C, L> {
    service: &'a SubtitleService<C, L>,
}

impl<'a, C, L> SubtitleProvider<'a, C, L>
where
    C: SubtitleCatalog,
    L: SeriesLibrary,
{
    pub fn new(service: &'a SubtitleService<C, L>) -> Self {
        Self { service }
    }

    /// Provider name shown by the media server
    pub fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Media kinds this provider can search subtitles for
    pub fn supported_media_types(&self) -> &'static [MediaKind] {
        &[MediaKind::Episode, MediaKind::Movie]
    }

    /// Searches subtitles for a media server request
    ///
    /// Only cancellation is reported as an error; incomplete requests and
    /// failed searches are logged and yield no results.
    pub fn search(
        &self,
        request: &SubtitleSearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteSubtitleInfo>, WizdomError> {
        let Some(kind) = request.content_type else {
            debug!("Unsupported content type, skipping search");
            return Ok(Vec::new());
        };

        let criteria = SearchCriteria {
            kind,
            imdb_id: request.imdb_id.clone().unwrap_or_default(),
            season: request.parent_index_number,
            episode: request.index_number,
            series_name: request.series_name.clone(),
            media_path: request.media_path.clone(),
            reference_filename: request.media_path.as_deref().and_then(video_file_name),
            language: request.language.clone(),
        };

        let candidates = match self.service.search(&criteria, cancel) {
            Ok(candidates) => candidates,
            Err(e) if e.kind() == ErrorKind::Cancelled => return Err(e),
            Err(e) => {
                warn!(
                    kind = ?kind,
                    path = ?request.media_path,
                    error = %e,
                    "Cannot search subtitles"
                );
                return Ok(Vec::new());
            }
        };

        Ok(candidates
            .into_iter()
            .map(|candidate| RemoteSubtitleInfo {
                name: candidate.display_name(),
                provider_name: PROVIDER_NAME.to_string(),
                language: candidate.handle.language.clone(),
                format: SUBTITLE_FORMAT.to_string(),
                is_hash_match: false,
                comment: format!("Wizdom ID: {}", candidate.id),
                id: candidate.handle.to_string(),
            })
            .collect())
    }

    /// Downloads the subtitle for a result id returned by [`Self::search`]
    pub fn get_subtitles(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<SubtitlePayload, WizdomError> {
        if id.trim().is_empty() {
            return Err(WizdomError::MissingCriteria("subtitle id".to_string()));
        }

        self.service.download_by_handle(id, cancel)
    }
}
