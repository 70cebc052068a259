//! Host-facing adapters
//!
//! Media servers reach the subtitle service in two shapes: as a subtitle
//! provider plugged into the server's own subtitle search, and as plain JSON
//! endpoints. Both are thin wrappers around [`SubtitleService`](crate::SubtitleService).
mod api;
mod provider;

pub use api::{
    ApiError, ApiHandler, ApiResponse, DownloadApiRequest, DownloadApiResponse, SearchApiRequest,
    SearchApiResponse, SubtitleInfo,
};
pub use provider::{PROVIDER_NAME, RemoteSubtitleInfo, SubtitleProvider, SubtitleSearchRequest};
