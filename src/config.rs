//! Runtime configuration loaded from the environment and `.env` files.
//!
//! Settings are resolved in this order: process environment, then `./.env`, then
//! `{config_dir}/tagdedup/.env`. Values already set are never overwritten.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Default minimum name similarity for two tags to be grouped.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const URL_VARS: [&str; 4] = [
    "PAPERLESS_API_URL",
    "PAPERLESS_URL",
    "PAPERLESS_NGX_URL",
    "PAPERLESS_HOST",
];

const TOKEN_VARS: [&str; 3] = ["PAPERLESS_TOKEN", "PAPERLESS_API_TOKEN", "PAPERLESS_APIKEY"];

const THRESHOLD_VAR: &str = "TAG_SIMILARITY_THRESHOLD";
const TIMEOUT_VAR: &str = "PAPERLESS_TIMEOUT_SECS";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is not present under any of its names
    #[error("Missing configuration: set {0}")]
    Missing(String),

    /// Similarity threshold outside [0, 1]
    #[error("Invalid similarity threshold {0}: must be between 0.0 and 1.0")]
    InvalidThreshold(f64),

    /// A numeric setting failed to parse
    #[error("Invalid value for {name}: {value:?}")]
    InvalidNumber { name: String, value: String },
}

/// Resolved settings for talking to Paperless-ngx and grouping tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub token: String,
    pub similarity_threshold: f64,
    pub timeout: Duration,
}

impl Config {
    /// Loads `.env` files and reads configuration from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        load_env_files();
        Self::from_env()
    }

    /// Reads configuration from the current process environment only.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when no URL or token variable is set, and
    /// a parse or range error for malformed numeric settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = first_env(&URL_VARS)
            .map(|url| normalize_base_url(&url))
            .ok_or_else(|| ConfigError::Missing(URL_VARS.join(" or ")))?;

        let token =
            first_env(&TOKEN_VARS).ok_or_else(|| ConfigError::Missing(TOKEN_VARS.join(" or ")))?;

        let similarity_threshold = match env_value(THRESHOLD_VAR) {
            Some(raw) => parse_threshold(&raw)?,
            None => DEFAULT_SIMILARITY_THRESHOLD,
        };

        let timeout_secs = match env_value(TIMEOUT_VAR) {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                name: TIMEOUT_VAR.to_string(),
                value: raw.clone(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            token,
            similarity_threshold,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Replaces the similarity threshold after validating it.
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        self.similarity_threshold = validate_threshold(threshold)?;
        Ok(self)
    }
}

/// Loads `./.env` and the per-user `.env`, ignoring files that don't exist.
pub fn load_env_files() {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded environment file");
    }

    if let Some(path) = user_env_path()
        && path.exists()
    {
        match dotenvy::from_path(&path) {
            Ok(()) => debug!(path = %path.display(), "loaded environment file"),
            Err(e) => debug!(path = %path.display(), error = %e, "skipping environment file"),
        }
    }
}

/// Returns `{config_dir}/tagdedup/.env`.
///
/// - Linux: `~/.config/tagdedup/.env`
/// - macOS: `~/Library/Application Support/tagdedup/.env`
/// - Windows: `C:\Users\<user>\AppData\Roaming\tagdedup\.env`
pub fn user_env_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tagdedup").join(".env"))
}

/// Strips surrounding whitespace, trailing slashes and a trailing `/api`.
///
/// # Examples
///
/// ```
/// use tagdedup::config::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://host:8000/api/"), "http://host:8000");
/// assert_eq!(normalize_base_url("http://host:8000"), "http://host:8000");
/// ```
#[must_use]
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let without_api = trimmed.strip_suffix("/api").unwrap_or(trimmed);
    without_api.trim_end_matches('/').to_string()
}

/// Parses and range-checks a similarity threshold.
pub fn parse_threshold(raw: &str) -> Result<f64, ConfigError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidNumber {
            name: THRESHOLD_VAR.to_string(),
            value: raw.to_string(),
        })?;
    validate_threshold(value)
}

fn validate_threshold(value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidThreshold(value))
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn first_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| env_value(name))
}
