//! The two backing stores.
//!
//! - [`QueryStore`]: the primary, structured store holding one [`QueryRecord`] per request.
//!   [`SqliteQueryStore`] is the production implementation.
//! - [`ResponseArchive`]: the semi-structured store holding one [`ResponseDocument`] per
//!   successfully answered request, keyed by the query identity. [`FileResponseArchive`] is the
//!   production implementation.
//!
//! The stores are written one after the other with no coordinating transaction. A query record
//! may therefore exist without a response document; nothing here reconciles the two.

pub mod archive;
pub mod sqlite;

pub use archive::FileResponseArchive;
pub use sqlite::SqliteQueryStore;

use crate::error::{ArchiveError, StoreError};
use crate::intake::Intake;
use chrono::{DateTime, Utc};
use quackhub_uuid::RecordId;
use serde::{Deserialize, Serialize};

/// One row of the primary store.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryRecord {
    pub id: RecordId,
    pub symptoms: String,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub duration: Option<String>,
    pub severity: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub is_emergency: bool,
}

/// Patient fields copied into the archive document at write time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub severity: Option<i64>,
}

/// One archived model response.
///
/// The emergency flag and `user_info` are snapshots of the query record taken when the
/// document is written; they are never updated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseDocument {
    pub document_id: RecordId,
    pub query_id: RecordId,
    pub symptoms: String,
    pub ai_response: String,
    pub is_emergency: bool,
    pub created_at: DateTime<Utc>,
    pub user_info: UserInfo,
}

impl ResponseDocument {
    /// Builds the archive document for a classified query.
    pub fn for_query(
        record: &QueryRecord,
        ai_response: String,
        is_emergency: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            document_id: RecordId::new(),
            query_id: record.id,
            symptoms: record.symptoms.clone(),
            ai_response,
            is_emergency,
            created_at,
            user_info: UserInfo {
                age: record.age,
                sex: record.sex.clone(),
                severity: record.severity,
            },
        }
    }
}

/// Primary record store.
pub trait QueryStore: Send + Sync {
    /// Inserts a new record with the emergency flag unset and returns it with its identity.
    fn insert(&self, intake: &Intake, created_at: DateTime<Utc>) -> Result<QueryRecord, StoreError>;

    /// Sets the emergency flag of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record has this identity.
    fn set_emergency(&self, id: &RecordId, is_emergency: bool) -> Result<(), StoreError>;

    fn get(&self, id: &RecordId) -> Result<Option<QueryRecord>, StoreError>;

    /// Up to `limit` records, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<QueryRecord>, StoreError>;

    fn count(&self) -> Result<u64, StoreError>;

    fn count_emergencies(&self) -> Result<u64, StoreError>;
}

/// Response archive.
pub trait ResponseArchive: Send + Sync {
    /// Stores a document. At most one document may exist per query identity.
    fn insert(&self, document: &ResponseDocument) -> Result<(), ArchiveError>;

    fn find_by_query(&self, query_id: &RecordId) -> Result<Option<ResponseDocument>, ArchiveError>;

    fn count(&self) -> Result<u64, ArchiveError>;
}
