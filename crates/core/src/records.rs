//! Read side: history, single-response lookup and statistics.

use crate::stores::{QueryRecord, QueryStore, ResponseArchive, ResponseDocument};
use crate::TriageResult;
use quackhub_uuid::RecordId;
use std::sync::Arc;

/// Aggregate counts plus the newest records.
///
/// `archived_responses` is counted from the archive on its own and can be lower than
/// `total_queries` when requests failed after the primary insert.
#[derive(Clone, Debug)]
pub struct Stats {
    pub total_queries: u64,
    pub emergency_cases: u64,
    pub archived_responses: u64,
    pub recent: Vec<QueryRecord>,
}

#[derive(Clone)]
pub struct RecordsService {
    queries: Arc<dyn QueryStore>,
    archive: Arc<dyn ResponseArchive>,
}

impl RecordsService {
    pub fn new(queries: Arc<dyn QueryStore>, archive: Arc<dyn ResponseArchive>) -> Self {
        Self { queries, archive }
    }

    /// Up to `limit` query records, newest first.
    pub fn history(&self, limit: usize) -> TriageResult<Vec<QueryRecord>> {
        Ok(self.queries.recent(limit)?)
    }

    /// The archived response for a query, if one was stored.
    pub fn response_for(&self, query_id: &RecordId) -> TriageResult<Option<ResponseDocument>> {
        Ok(self.archive.find_by_query(query_id)?)
    }

    pub fn stats(&self, recent_limit: usize) -> TriageResult<Stats> {
        Ok(Stats {
            total_queries: self.queries.count()?,
            emergency_cases: self.queries.count_emergencies()?,
            archived_responses: self.archive.count()?,
            recent: self.queries.recent(recent_limit)?,
        })
    }
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn symptom_preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
