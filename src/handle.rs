//! Composite subtitle handles
//!
//! A handle such as `srt-heb-12345` names one catalog candidate by format,
//! language and Wizdom id, so it can be downloaded later without searching
//! again.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Format tag of every subtitle served by Wizdom
pub const SUBTITLE_FORMAT: &str = "srt";

/// Errors that can occur while parsing a handle
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandleError {
    /// The handle does not consist of exactly three non-empty segments
    #[error("Invalid subtitle id format: {0}")]
    InvalidFormat(String),

    /// The last segment is not a Wizdom id
    #[error("Invalid Wizdom id in: {0}")]
    InvalidId(String),
}

/// Parsed `format-language-id` handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubtitleHandle {
    /// Subtitle format, e.g. `srt`
    pub format: String,
    /// Language tag without region, e.g. `he` or `heb`
    pub language: String,
    /// Wizdom subtitle id
    pub id: u64,
}

impl SubtitleHandle {
    /// Creates an `srt` handle for a catalog candidate
    ///
    /// Only the primary subtag of `language` is kept (`he-IL` becomes `he`),
    /// since the handle itself is hyphen-delimited.
    pub fn new(language: &str, id: u64) -> Self {
        Self {
            format: SUBTITLE_FORMAT.to_string(),
            language: primary_subtag(language).to_string(),
            id,
        }
    }
}

/// The part of a language tag before the first hyphen or underscore
pub fn primary_subtag(language: &str) -> &str {
    language
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
}

impl fmt::Display for SubtitleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.format, self.language, self.id)
    }
}

impl FromStr for SubtitleHandle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        let [format, language, id] = parts.as_slice() else {
            return Err(HandleError::InvalidFormat(s.to_string()));
        };

        if format.is_empty() || language.is_empty() || id.is_empty() {
            return Err(HandleError::InvalidFormat(s.to_string()));
        }

        let id = id
            .parse()
            .map_err(|_| HandleError::InvalidId(s.to_string()))?;

        Ok(Self {
            format: format.to_string(),
            language: language.to_string(),
            id,
        })
    }
}
