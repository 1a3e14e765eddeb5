//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the stores and services.
//! Nothing in the core reads environment variables while handling a request; binaries read them
//! and hand the values to the constructors and `*_from_env_value` helpers below.

use crate::constants::{
    DEFAULT_ARCHIVE_DIR, DEFAULT_DATABASE_PATH, DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL,
};
use crate::{TriageError, TriageResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// Storage locations resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    archive_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidInput` if either path is empty, or if both point at the same
    /// location.
    pub fn new(database_path: PathBuf, archive_dir: PathBuf) -> TriageResult<Self> {
        if database_path.as_os_str().is_empty() {
            return Err(TriageError::InvalidInput(
                "database path cannot be empty".into(),
            ));
        }
        if archive_dir.as_os_str().is_empty() {
            return Err(TriageError::InvalidInput(
                "archive directory cannot be empty".into(),
            ));
        }
        if database_path == archive_dir {
            return Err(TriageError::InvalidInput(
                "database path and archive directory must differ".into(),
            ));
        }

        Ok(Self {
            database_path,
            archive_dir,
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }
}

/// Connection settings for the Gemini API.
#[derive(Clone)]
pub struct GeminiConfig {
    api_key: String,
    model: String,
    api_url: String,
}

impl GeminiConfig {
    /// Create a new `GeminiConfig`.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidInput` if:
    /// - the API key or model name is blank,
    /// - the API URL is not an `http://` or `https://` URL.
    pub fn new(api_key: String, model: String, api_url: String) -> TriageResult<Self> {
        if api_key.trim().is_empty() {
            return Err(TriageError::InvalidInput(
                "GEMINI_API_KEY cannot be empty".into(),
            ));
        }
        if model.trim().is_empty() {
            return Err(TriageError::InvalidInput(
                "Gemini model name cannot be empty".into(),
            ));
        }
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(TriageError::InvalidInput(format!(
                "Gemini API URL must start with http:// or https://, got: '{}'",
                api_url
            )));
        }

        Ok(Self {
            api_key,
            model: model.trim().to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Full URL of the `generateContent` method for the configured model.
    pub fn generate_content_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the database path from an optional value, falling back to the default.
pub fn database_path_from_env_value(value: Option<String>) -> PathBuf {
    PathBuf::from(non_blank(value).unwrap_or_else(|| DEFAULT_DATABASE_PATH.into()))
}

/// Resolve the archive directory from an optional value, falling back to the default.
pub fn archive_dir_from_env_value(value: Option<String>) -> PathBuf {
    PathBuf::from(non_blank(value).unwrap_or_else(|| DEFAULT_ARCHIVE_DIR.into()))
}

/// Resolve the Gemini model name from an optional value, falling back to the default.
pub fn gemini_model_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into())
}

/// Resolve the Gemini API base URL from an optional value, falling back to the default.
pub fn gemini_api_url_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_GEMINI_API_URL.into())
}
