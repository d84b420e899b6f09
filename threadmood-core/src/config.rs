//! User preferences persisted as TOML.
//!
//! The pipeline itself only consumes the endpoint, the extraction limit and the
//! timeouts; the theme is read by the front end.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_EXTRACTION_LIMIT: usize = 200;
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const APP_DIR: &str = "threadmood";
const PREFERENCES_FILE: &str = "preferences.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Selector-like patterns used to find comment threads on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSelectors {
    pub comment_text: String,
    pub thread: String,
    pub author: String,
    pub replies: String,
}

impl Default for ExtractionSelectors {
    fn default() -> Self {
        Self {
            comment_text: "#content-text".to_string(),
            thread: "ytd-comment-thread-renderer".to_string(),
            author: "#author-text".to_string(),
            replies: "ytd-comment-replies-renderer".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub api_url: String,
    pub theme: Theme,
    pub extraction_limit: usize,
    pub extraction_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub selectors: ExtractionSelectors,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            theme: Theme::default(),
            extraction_limit: DEFAULT_EXTRACTION_LIMIT,
            extraction_timeout_secs: DEFAULT_EXTRACTION_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            selectors: ExtractionSelectors::default(),
        }
    }
}

impl Preferences {
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        validate_endpoint(&self.api_url)
    }
}

/// Parse the classification endpoint. Only absolute http(s) URLs are accepted.
pub fn validate_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingField {
            field: "api_url".to_string(),
        });
    }

    let invalid = || ConfigError::InvalidValue {
        field: "api_url".to_string(),
        value: trimmed.to_string(),
    };

    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(invalid()),
    }
}

#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/threadmood/preferences.toml`
    pub fn default_location() -> Result<Self, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(base.join(APP_DIR).join(PREFERENCES_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read preferences, falling back to defaults when the file does not exist.
    pub fn load(&self) -> Result<Preferences, ConfigError> {
        if !self.path.exists() {
            debug!("No preferences at {}, using defaults", self.path.display());
            return Ok(Preferences::default());
        }

        let contents = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let preferences: Preferences = toml::from_str(&contents)?;
        info!("Loaded preferences from {}", self.path.display());
        Ok(preferences)
    }

    pub fn save(&self, preferences: &Preferences) -> Result<(), ConfigError> {
        let io_error = |source: std::io::Error| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let contents = toml::to_string_pretty(preferences)?;
        fs::write(&self.path, contents).map_err(io_error)?;
        debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}
