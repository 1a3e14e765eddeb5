use quackhub_uuid::RecordId;

/// Failures of the primary (SQLite) query store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
    #[error("failed to create database directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("query record not found: {0}")]
    NotFound(RecordId),
    #[error("stored row is invalid: {0}")]
    InvalidRow(String),
    #[error("failed to allocate a unique query id after {0} attempts")]
    IdAllocation(usize),
    #[error("query store lock poisoned")]
    LockPoisoned,
}

/// Failures of the response archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to create archive directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("a response document already exists for query {0}")]
    DuplicateDocument(RecordId),
    #[error("failed to write response document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read response document: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error(
        "archive write failed and cleanup also failed (path: {path}): write={write_error}; cleanup={cleanup_error}",
        path = path.display()
    )]
    CleanupAfterWriteFailed {
        path: std::path::PathBuf,
        #[source]
        write_error: Box<ArchiveError>,
        cleanup_error: std::io::Error,
    },
}

/// Failures of the external language model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response could not be decoded: {0}")]
    Decode(serde_json::Error),
    #[error("model blocked the prompt: {0}")]
    Blocked(String),
    #[error("model returned no text")]
    EmptyResponse,
}

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;
