/// Wizdom subtitle catalog implementation.
use super::wizdom_types::WizdomSubtitle;
use super::{CatalogError, CatalogQuery, CatalogSubtitle, SubtitleCatalog};
use crate::cancellation::{CancellationToken, run_cancellable};
use crate::config::Config;
use std::io::Read;
use tracing::debug;

/// Catalog client for the Wizdom API.
///
/// Searches go to `{base}/search?action=by_id` and subtitle archives are
/// downloaded from `{base}/files/sub/{id}`.
#[derive(Debug, Clone)]
pub struct WizdomCatalog {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl WizdomCatalog {
    /// Creates a client for the endpoint and user agent in `config`.
    pub fn new(config: &Config) -> Result<Self, CatalogError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| CatalogError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the search request for `query`.
    ///
    /// The API expects `season` and `episode` even for movies, where both are 0.
    fn search_request(
        &self,
        query: &CatalogQuery,
    ) -> Result<reqwest::blocking::Request, CatalogError> {
        let url = format!("{}/search", self.base_url);
        let season = query.season_param().to_string();
        let episode = query.episode_param().to_string();

        self.client
            .get(&url)
            .query(&[
                ("action", "by_id"),
                ("imdb", query.imdb_id.as_str()),
                ("season", season.as_str()),
                ("episode", episode.as_str()),
            ])
            .build()
            .map_err(|e| CatalogError::RequestFailed {
                url,
                reason: e.to_string(),
            })
    }

    /// Builds the archive download request for a subtitle id.
    fn archive_request(
        &self,
        subtitle_id: u64,
    ) -> Result<reqwest::blocking::Request, CatalogError> {
        let url = format!("{}/files/sub/{}", self.base_url, subtitle_id);

        self.client
            .get(&url)
            .build()
            .map_err(|e| CatalogError::RequestFailed {
                url,
                reason: e.to_string(),
            })
    }

    /// Executes a request and reads the complete response body.
    ///
    /// The body is read in chunks so a cancelled download stops early.
    fn fetch_body(
        &self,
        request: reqwest::blocking::Request,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, CatalogError> {
        let client = self.client.clone();
        let worker_cancel = cancel.clone();

        let outcome = run_cancellable(cancel, move || {
            let url = request.url().to_string();
            debug!(%url, "Requesting");

            let mut response =
                client
                    .execute(request)
                    .map_err(|e| CatalogError::RequestFailed {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;

            if !response.status().is_success() {
                return Err(CatalogError::HttpStatus {
                    url,
                    status: response.status().as_u16(),
                });
            }

            let mut body = Vec::new();
            let mut buffer = [0; 8192];

            loop {
                if worker_cancel.is_cancelled() {
                    return Err(CatalogError::Cancelled);
                }

                let bytes_read =
                    response
                        .read(&mut buffer)
                        .map_err(|e| CatalogError::RequestFailed {
                            url: url.clone(),
                            reason: e.to_string(),
                        })?;

                if bytes_read == 0 {
                    break;
                }

                body.extend_from_slice(&buffer[..bytes_read]);
            }

            Ok(body)
        });

        outcome.unwrap_or(Err(CatalogError::Cancelled))
    }
}

/// Parses the body of a search response.
///
/// An empty body or a JSON `null` means no subtitles.
fn parse_search_response(body: &[u8]) -> Result<Vec<CatalogSubtitle>, CatalogError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let subtitles: Option<Vec<WizdomSubtitle>> =
        serde_json::from_slice(body).map_err(|e| CatalogError::ParseError(e.to_string()))?;

    Ok(subtitles
        .unwrap_or_default()
        .into_iter()
        .map(|s| CatalogSubtitle {
            id: s.id,
            version_name: s.versioname,
        })
        .collect())
}

impl SubtitleCatalog for WizdomCatalog {
    fn search(
        &self,
        query: &CatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<CatalogSubtitle>, CatalogError> {
        let request = self.search_request(query)?;
        let body = self.fetch_body(request, cancel)?;
        let subtitles = parse_search_response(&body)?;

        debug!(
            imdb = %query.imdb_id,
            count = subtitles.len(),
            "Found subtitles from API"
        );

        Ok(subtitles)
    }

    fn fetch_archive(
        &self,
        subtitle_id: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, CatalogError> {
        let request = self.archive_request(subtitle_id)?;
        self.fetch_body(request, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EpisodeNumber;

    fn catalog() -> WizdomCatalog {
        WizdomCatalog::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_episode_search_url() {
        let request = catalog()
            .search_request(&CatalogQuery {
                imdb_id: "tt1234567".to_string(),
                episode: Some(EpisodeNumber {
                    season: 1,
                    episode: 2,
                }),
            })
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://wizdom.xyz/api/search?action=by_id&imdb=tt1234567&season=1&episode=2"
        );
    }

    #[test]
    fn test_movie_search_url_uses_zero() {
        let request = catalog()
            .search_request(&CatalogQuery {
                imdb_id: "tt0387808".to_string(),
                episode: None,
            })
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://wizdom.xyz/api/search?action=by_id&imdb=tt0387808&season=0&episode=0"
        );
    }

    #[test]
    fn test_archive_url_with_trailing_slash_base() {
        let config = Config {
            base_url: "https://mirror.example/api/".to_string(),
            ..Config::default()
        };
        let request = WizdomCatalog::new(&config)
            .unwrap()
            .archive_request(99)
            .unwrap();

        assert_eq!(request.url().as_str(), "https://mirror.example/api/files/sub/99");
    }

    #[test]
    fn test_parse_search_response() {
        let body = br#"[
            {"id": 10, "versioname": "Show.S01E02.WEB"},
            {"id": 11, "versioname": null},
            {"id": 12}
        ]"#;

        let subtitles = parse_search_response(body).unwrap();
        assert_eq!(
            subtitles,
            vec![
                CatalogSubtitle {
                    id: 10,
                    version_name: Some("Show.S01E02.WEB".to_string()),
                },
                CatalogSubtitle {
                    id: 11,
                    version_name: None,
                },
                CatalogSubtitle {
                    id: 12,
                    version_name: None,
                },
            ]
        );
    }

    #[test]
    fn test_parse_empty_responses() {
        assert!(parse_search_response(b"").unwrap().is_empty());
        assert!(parse_search_response(b"  \n").unwrap().is_empty());
        assert!(parse_search_response(b"null").unwrap().is_empty());
        assert!(parse_search_response(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_response() {
        assert!(matches!(
            parse_search_response(b"<html>Bad gateway</html>"),
            Err(CatalogError::ParseError(_))
        ));
    }

    #[test]
    fn test_cancelled_before_request() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = catalog().fetch_archive(99, &cancel);
        assert!(matches!(result, Err(CatalogError::Cancelled)));
    }
}
