//! Constants used throughout the QuackHub core crate.

/// Default path of the SQLite primary store when none is configured.
pub const DEFAULT_DATABASE_PATH: &str = "quackhub_data/queries.sqlite3";

/// Default root of the response archive when none is configured.
pub const DEFAULT_ARCHIVE_DIR: &str = "quackhub_data/responses";

/// Filename of a response document inside its sharded directory.
pub const RESPONSE_DOCUMENT_FILENAME: &str = "response.yaml";

/// Gemini model used when `GEMINI_MODEL` is unset.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro-002";

/// Base URL of the Gemini REST API.
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Placeholder rendered for an optional patient field that was not supplied.
pub const NOT_PROVIDED: &str = "Not provided";

/// Severities at or above this value are always flagged as emergencies.
pub const EMERGENCY_SEVERITY_THRESHOLD: i64 = 8;

/// Number of records returned by the history endpoint.
pub const HISTORY_LIMIT: usize = 10;

/// Number of records listed under `recent_queries` in the statistics.
pub const RECENT_QUERIES_LIMIT: usize = 5;

/// Symptom text is cut to this many characters in the statistics listing.
pub const SYMPTOM_PREVIEW_CHARS: usize = 50;
