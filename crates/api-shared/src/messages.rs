//! JSON bodies exchanged over the HTTP API.
//!
//! Field names are part of the public contract (including `mongo_responses`, kept for existing
//! dashboards) and must not be renamed.

use quackhub_types::LooseValue;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of `POST /analyze`.
///
/// Every field is loosely typed. Only `symptoms` is required, and that is enforced by the
/// handler rather than by deserialization so that a missing value gets the usual 400 payload.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct AnalyzeReq {
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "Sharp headache behind the eyes")]
    pub symptoms: Option<LooseValue>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "34")]
    pub age: Option<LooseValue>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "female")]
    pub sex: Option<LooseValue>,
    /// Pounds.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "140")]
    pub weight: Option<LooseValue>,
    /// Inches.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "66")]
    pub height: Option<LooseValue>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2 days")]
    pub duration: Option<LooseValue>,
    /// 1-10.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "6")]
    pub severity: Option<LooseValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeRes {
    pub success: bool,
    pub diagnosis: String,
    pub is_emergency: bool,
    pub query_id: String,
    /// `HH:MM:SS AM/PM`, server local time.
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub id: String,
    pub symptoms: String,
    pub age: Option<i64>,
    pub severity: Option<i64>,
    pub is_emergency: bool,
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryRes {
    pub history: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserInfoRes {
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub severity: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResponseDocumentRes {
    pub document_id: String,
    pub query_id: String,
    pub symptoms: String,
    pub ai_response: String,
    pub is_emergency: bool,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub user_info: UserInfoRes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResponseRes {
    pub response: ResponseDocumentRes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecentQuery {
    /// At most the first 50 characters.
    pub symptoms: String,
    pub severity: Option<i64>,
    /// `YYYY-MM-DD HH:MM`, UTC.
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsRes {
    pub total_queries: u64,
    pub emergency_cases: u64,
    #[serde(rename = "mongo_responses")]
    pub archived_responses: u64,
    pub recent_queries: Vec<RecentQuery>,
}
