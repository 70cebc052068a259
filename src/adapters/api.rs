//! JSON endpoint shape
//!
//! Two endpoints, `Search` and `DownloadToItemFolder`, taking and returning
//! JSON bodies. The web server itself lives in the host; [`ApiHandler::handle`]
//! maps an endpoint name and request body to a status code and response body.

use crate::{ErrorKind, WizdomError};
use crate::cancellation::CancellationToken;
use crate::catalog::SubtitleCatalog;
use crate::resolver::{MediaKind, SeriesLibrary};
use crate::service::{DownloadRequest, SearchCriteria, SubtitleService};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Body of the `Search` endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchApiRequest {
    pub imdb_id: String,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
    /// Local filename to rank results against
    #[serde(default)]
    pub filename: Option<String>,
}

impl SearchApiRequest {
    fn criteria(&self) -> SearchCriteria {
        // The endpoint has no content type; season and episode imply an episode
        let kind = match (self.season, self.episode) {
            (Some(_), Some(_)) => MediaKind::Episode,
            _ => MediaKind::Movie,
        };

        SearchCriteria {
            kind,
            season: self.season,
            episode: self.episode,
            reference_filename: self.filename.clone(),
            ..SearchCriteria::movie(self.imdb_id.clone())
        }
    }
}

/// One entry of the `Search` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleInfo {
    pub id: u64,
    pub name: Option<String>,
}

/// Response of the `Search` endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchApiResponse {
    pub subtitles: Vec<SubtitleInfo>,
}

/// Body of the `DownloadToItemFolder` endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadApiRequest {
    #[serde(flatten)]
    pub search: SearchApiRequest,
    /// Video the subtitle is saved next to
    pub video_path: PathBuf,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub overwrite_existing: bool,
}

/// Response of the `DownloadToItemFolder` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadApiResponse {
    pub path: PathBuf,
}

/// An error response with its HTTP status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }
}

impl From<WizdomError> for ApiError {
    fn from(error: WizdomError) -> Self {
        let status = match error.kind() {
            ErrorKind::Input => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Cancelled => 499,
            ErrorKind::Transport => 502,
            ErrorKind::FileSystem | ErrorKind::Configuration => 500,
        };

        Self {
            status,
            message: error.to_string(),
        }
    }
}

/// Status code and JSON body of a handled request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(&ApiError {
                status: 500,
                message: e.to_string(),
            }),
        }
    }

    fn error(error: &ApiError) -> Self {
        Self {
            status: error.status,
            body: serde_json::json!({ "message": error.message }).to_string(),
        }
    }
}

/// The service in JSON endpoint shape
#[derive(Debug)]
pub struct ApiHandler<'a, C, L> {
    service: &'a SubtitleService<C, L>,
}

impl<'a, C, L> ApiHandler<'a, C, L>
where
    C: SubtitleCatalog,
    L: SeriesLibrary,
{
    pub fn new(service: &'a SubtitleService<C, L>) -> Self {
        Self { service }
    }

    /// Handles a request to `endpoint` with a JSON `body`
    pub fn handle(&self, endpoint: &str, body: &str, cancel: &CancellationToken) -> ApiResponse {
        match endpoint {
            "Search" => match serde_json::from_str::<SearchApiRequest>(body) {
                Ok(request) => match self.search(&request, cancel) {
                    Ok(response) => ApiResponse::json(200, &response),
                    Err(e) => ApiResponse::error(&e),
                },
                Err(e) => ApiResponse::error(&ApiError::bad_request(e.to_string())),
            },
            "DownloadToItemFolder" => match serde_json::from_str::<DownloadApiRequest>(body) {
                Ok(request) => match self.download_to_item_folder(&request, cancel) {
                    Ok(response) => ApiResponse::json(200, &response),
                    Err(e) => ApiResponse::error(&e),
                },
                Err(e) => ApiResponse::error(&ApiError::bad_request(e.to_string())),
            },
            _ => ApiResponse::error(&ApiError {
                status: 404,
                message: format!("Unknown endpoint: {endpoint}"),
            }),
        }
    }

    /// `Search`: ranked subtitles for an IMDb id
    pub fn search(
        &self,
        request: &SearchApiRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchApiResponse, ApiError> {
        if request.imdb_id.trim().is_empty() {
            return Err(ApiError::bad_request("ImdbId is required"));
        }

        let candidates = self.service.search(&request.criteria(), cancel)?;

        Ok(SearchApiResponse {
            subtitles: candidates
                .into_iter()
                .map(|c| SubtitleInfo {
                    id: c.id,
                    name: c.name,
                })
                .collect(),
        })
    }

    /// `DownloadToItemFolder`: saves the best subtitle next to a video
    pub fn download_to_item_folder(
        &self,
        request: &DownloadApiRequest,
        cancel: &CancellationToken,
    ) -> Result<DownloadApiResponse, ApiError> {
        if request.search.imdb_id.trim().is_empty() {
            return Err(ApiError::bad_request("ImdbId is required"));
        }
        if request.video_path.as_os_str().is_empty() {
            return Err(ApiError::bad_request("VideoPath is required"));
        }

        let mut criteria = request.search.criteria();
        criteria.language = request.language_code.clone();

        let path = self.service.download_to_file(
            &DownloadRequest {
                criteria,
                video_path: request.video_path.clone(),
                overwrite: Some(request.overwrite_existing),
            },
            cancel,
        )?;

        Ok(DownloadApiResponse { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::zip_archive;
    use crate::config::Config;
    use crate::resolver::EmptyLibrary;
    use crate::service::tests::FakeCatalog;
    use std::fs;

    fn service(catalog: FakeCatalog) -> SubtitleService<FakeCatalog, EmptyLibrary> {
        SubtitleService::new(catalog, EmptyLibrary, Config::default())
    }

    #[test]
    fn test_search_endpoint() {
        let service = service(FakeCatalog::with_results(&[
            (10, Some("Show.S01E02.WEB")),
            (11, Some("Show.S01E02.HDTV")),
        ]));
        let handler = ApiHandler::new(&service);

        let response = handler.handle(
            "Search",
            r#"{"imdbId": "tt1234567", "season": 1, "episode": 2, "filename": "Show.S01E02.HDTV.mkv"}"#,
            &CancellationToken::new(),
        );

        assert_eq!(response.status, 200);
        let body: SearchApiResponse = serde_json::from_str(&response.body).unwrap();
        assert_eq!(
            body.subtitles,
            vec![
                SubtitleInfo {
                    id: 11,
                    name: Some("Show.S01E02.HDTV".to_string())
                },
                SubtitleInfo {
                    id: 10,
                    name: Some("Show.S01E02.WEB".to_string())
                },
            ]
        );
    }

    #[test]
    fn test_search_requires_imdb_id() {
        let service = service(FakeCatalog::default());
        let handler = ApiHandler::new(&service);

        let response = handler.handle("Search", r#"{"imdbId": ""}"#, &CancellationToken::new());
        assert_eq!(response.status, 400);
        assert!(response.body.contains("ImdbId is required"));

        let response = handler.handle("Search", "not json", &CancellationToken::new());
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_unknown_endpoint() {
        let service = service(FakeCatalog::default());
        let response = ApiHandler::new(&service).handle("Upload", "{}", &CancellationToken::new());
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_download_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        fs::write(&video, b"video").unwrap();

        let service = service(
            FakeCatalog::with_results(&[(7, Some("movie"))])
                .with_archive(7, zip_archive(&[("movie.srt", b"subtitle")])),
        );
        let handler = ApiHandler::new(&service);

        let body = serde_json::json!({
            "imdbId": "tt0387808",
            "videoPath": video,
            "languageCode": "he",
        })
        .to_string();
        let response = handler.handle("DownloadToItemFolder", &body, &CancellationToken::new());

        assert_eq!(response.status, 200);
        let body: DownloadApiResponse = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body.path, dir.path().join("movie.he.srt"));
        assert_eq!(fs::read(&body.path).unwrap(), b"subtitle");
    }

    #[test]
    fn test_download_endpoint_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        fs::write(&video, b"video").unwrap();
        let cancel = CancellationToken::new();

        let request = DownloadApiRequest {
            search: SearchApiRequest {
                imdb_id: "tt0387808".to_string(),
                ..SearchApiRequest::default()
            },
            video_path: video.clone(),
            ..DownloadApiRequest::default()
        };

        // No candidates
        let empty = service(FakeCatalog::default());
        let error = ApiHandler::new(&empty)
            .download_to_item_folder(&request, &cancel)
            .unwrap_err();
        assert_eq!(error.status, 404);

        // Candidate without archive
        let broken = service(FakeCatalog::with_results(&[(7, None)]));
        let error = ApiHandler::new(&broken)
            .download_to_item_folder(&request, &cancel)
            .unwrap_err();
        assert_eq!(error.status, 502);

        // Missing video path
        let error = ApiHandler::new(&empty)
            .download_to_item_folder(
                &DownloadApiRequest {
                    video_path: PathBuf::new(),
                    ..request.clone()
                },
                &cancel,
            )
            .unwrap_err();
        assert_eq!(error.status, 400);
    }
}
