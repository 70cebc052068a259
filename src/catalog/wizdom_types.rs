/// Wizdom API response types for deserialization.
///
/// These structures mirror the JSON response format of the Wizdom API.
use serde::Deserialize;

/// A single entry of the `search?action=by_id` response array.
#[derive(Debug, Deserialize)]
pub(super) struct WizdomSubtitle {
    /// Wizdom subtitle id, used for `files/sub/{id}`
    pub id: u64,
    /// Release name the subtitle was synced to (may be null or missing)
    #[serde(default)]
    pub versioname: Option<String>,
}
