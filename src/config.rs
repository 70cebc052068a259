//! Configuration module
//!
//! Settings are read from a TOML file in the platform's configuration
//! directory and handed to the components that need them at construction
//! time. A missing file means built-in defaults.

use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default Wizdom API endpoint
pub const DEFAULT_BASE_URL: &str = "https://wizdom.xyz/api";

/// Default user agent sent with every catalog request
pub const DEFAULT_USER_AGENT: &str = "WizdomSubsDownloader/1.0";

/// Language used when neither the request nor the configuration names one
pub const FALLBACK_LANGUAGE: &str = "he";

/// Errors that can occur while loading or saving the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine the configuration directory location
    #[error("Failed to determine configuration directory location")]
    ConfigDirectoryNotFound,

    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write the configuration file
    #[error("Failed to write config file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unexpected fields
    #[error("Invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to serialize the configuration
    #[error("Failed to serialize config: {0}")]
    SerializationFailed(#[from] toml::ser::Error),
}

/// A series known to the local library, as listed in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySeries {
    /// Series name as shown in the library
    pub name: String,
    /// Root directory holding the series' episodes
    pub path: PathBuf,
    /// IMDb id of the series itself
    #[serde(default)]
    pub imdb_id: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Wizdom API (without trailing slash)
    pub base_url: String,
    /// User agent for catalog requests
    pub user_agent: String,
    /// Preferred subtitle languages, most preferred first
    #[serde(deserialize_with = "deserialize_languages")]
    pub preferred_languages: Vec<String>,
    /// Whether existing subtitle files may be replaced
    pub overwrite_existing: bool,
    /// Manual series mappings, one `Series Name:tt1234567` per line
    pub series_mappings: String,
    /// Series of the local library
    pub library: Vec<LibrarySeries>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            preferred_languages: vec!["he".to_string(), "he-IL".to_string()],
            overwrite_existing: false,
            series_mappings: String::new(),
            library: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the configuration from the default location
    ///
    /// Returns the built-in defaults if no configuration file exists yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads the configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Writes the configuration to the given file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Path of the user configuration file
    ///
    /// - Linux: ~/.config/wizdomsubs/config.toml
    /// - macOS: ~/Library/Application Support/xyz.wizdom.wizdomsubs/config.toml
    /// - Windows: %APPDATA%\wizdom\wizdomsubs\config\config.toml
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = ProjectDirs::from("xyz", "wizdom", "wizdomsubs")
            .ok_or(ConfigError::ConfigDirectoryNotFound)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// The language used when a request does not name one
    pub fn default_language(&self) -> &str {
        self.preferred_languages
            .iter()
            .map(|lang| lang.trim())
            .find(|lang| !lang.is_empty())
            .unwrap_or(FALLBACK_LANGUAGE)
    }

    /// Parses the manual series mappings blob
    pub fn series_mappings(&self) -> SeriesMappings {
        SeriesMappings::parse(&self.series_mappings)
    }
}

/// Accepts either a TOML array or a comma separated string of languages
fn deserialize_languages<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Languages {
        List(Vec<String>),
        Csv(String),
    }

    let languages = match Languages::deserialize(deserializer)? {
        Languages::List(list) => list,
        Languages::Csv(csv) => csv.split(',').map(str::to_string).collect(),
    };

    Ok(languages
        .into_iter()
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
        .collect())
}

/// Manual mapping from series names to series IMDb ids
///
/// Keys are matched case-insensitively. Entries keep the order in which they
/// appear in the configuration; a later duplicate key replaces the earlier
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesMappings {
    entries: Vec<(String, String)>,
}

impl SeriesMappings {
    /// Parses a newline-delimited `name:id` blob
    ///
    /// The id is taken after the last colon, so series names may themselves
    /// contain colons. Blank lines, lines without a colon and lines with an
    /// empty name or id are skipped.
    pub fn parse(blob: &str) -> Self {
        let mut mappings = Self::default();

        for line in blob.lines() {
            let Some((name, id)) = line.rsplit_once(':') else {
                continue;
            };
            let (name, id) = (name.trim(), id.trim());
            if name.is_empty() || id.is_empty() {
                continue;
            }
            mappings.insert(name, id);
        }

        mappings
    }

    fn insert(&mut self, name: &str, id: &str) {
        let existing = self
            .entries
            .iter_mut()
            .find(|(key, _)| key.to_lowercase() == name.to_lowercase());

        match existing {
            Some(entry) => entry.1 = id.to_string(),
            None => self.entries.push((name.to_string(), id.to_string())),
        }
    }

    /// Looks up the id for a series name, ignoring case
    pub fn get(&self, series_name: &str) -> Option<&str> {
        let wanted = series_name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(_, id)| id.as_str())
    }

    /// Number of mappings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no mappings
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
