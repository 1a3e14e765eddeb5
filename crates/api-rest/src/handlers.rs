//! Request handlers for the REST API.

use crate::error::{ApiError, RESPONSE_NOT_FOUND};
use crate::AppState;
use api_shared::{
    AnalyzeReq, AnalyzeRes, ErrorRes, HealthRes, HealthService, HistoryEntry, HistoryRes,
    RecentQuery, ResponseDocumentRes, ResponseRes, StatsRes, UserInfoRes,
};
use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::SecondsFormat;
use quackhub_core::constants::{HISTORY_LIMIT, RECENT_QUERIES_LIMIT, SYMPTOM_PREVIEW_CHARS};
use quackhub_core::timefmt::{clock_time, history_timestamp, stats_timestamp};
use quackhub_core::{parse_severity, symptom_preview, IntakeForm, QueryRecord, ResponseDocument};
use quackhub_types::LooseValue;
use quackhub_uuid::RecordId;

/// Severity as the classifier reads it. Numeric text goes through [`parse_severity`].
fn severity(value: LooseValue) -> Option<i64> {
    match value {
        LooseValue::Text(text) => parse_severity(&text),
        other => other.as_integer(),
    }
}

/// Maps the loosely typed request onto an intake form. Unusable values become `None`.
pub(crate) fn intake_form(req: AnalyzeReq) -> IntakeForm {
    IntakeForm {
        symptoms: req.symptoms.and_then(|v| v.as_text()),
        age: req.age.and_then(|v| v.as_integer()),
        sex: req.sex.and_then(|v| v.as_text()),
        weight: req.weight.and_then(|v| v.as_number()),
        height: req.height.and_then(|v| v.as_number()),
        duration: req.duration.and_then(|v| v.as_text()),
        severity: req.severity.and_then(severity),
    }
}

fn history_entry(record: QueryRecord) -> HistoryEntry {
    HistoryEntry {
        id: record.id.to_string(),
        timestamp: history_timestamp(&record.created_at),
        symptoms: record.symptoms,
        age: record.age,
        severity: record.severity,
        is_emergency: record.is_emergency,
    }
}

fn recent_query(record: &QueryRecord) -> RecentQuery {
    RecentQuery {
        symptoms: symptom_preview(&record.symptoms, SYMPTOM_PREVIEW_CHARS).to_string(),
        severity: record.severity,
        timestamp: stats_timestamp(&record.created_at),
    }
}

fn response_document(doc: ResponseDocument) -> ResponseDocumentRes {
    ResponseDocumentRes {
        document_id: doc.document_id.to_string(),
        query_id: doc.query_id.to_string(),
        symptoms: doc.symptoms,
        ai_response: doc.ai_response,
        is_emergency: doc.is_emergency,
        timestamp: doc.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        user_info: UserInfoRes {
            age: doc.user_info.age,
            sex: doc.user_info.sex,
            severity: doc.user_info.severity,
        },
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Liveness check. Does not touch the stores or the model.
#[axum::debug_handler]
pub(crate) async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeReq,
    responses(
        (status = 200, description = "Model assessment with emergency flag", body = AnalyzeRes),
        (status = 400, description = "Symptoms missing or empty", body = ErrorRes),
        (status = 500, description = "Store or model failure", body = ErrorRes)
    )
)]
/// Analyse a symptom description.
///
/// Stores the query, asks the model for an assessment, flags potential emergencies and archives
/// the response.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - `symptoms` is missing, empty or whitespace-only.
///
/// Returns `500 Internal Server Error` if:
/// - either store fails,
/// - the model call fails.
#[axum::debug_handler]
pub(crate) async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeReq>,
) -> Result<Json<AnalyzeRes>, ApiError> {
    let outcome = state.analysis.analyze(intake_form(req)).await?;

    Ok(Json(AnalyzeRes {
        success: true,
        query_id: outcome.query_id.to_string(),
        timestamp: clock_time(&outcome.completed_at),
        diagnosis: outcome.diagnosis,
        is_emergency: outcome.is_emergency,
    }))
}

#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "Most recent queries, newest first", body = HistoryRes),
        (status = 500, description = "Store failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn history(State(state): State<AppState>) -> Result<Json<HistoryRes>, ApiError> {
    let records = state.records.history(HISTORY_LIMIT)?;

    Ok(Json(HistoryRes {
        history: records.into_iter().map(history_entry).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/response/{query_id}",
    params(
        ("query_id" = String, Path, description = "Query identity returned by /analyze")
    ),
    responses(
        (status = 200, description = "Archived response document", body = ResponseRes),
        (status = 404, description = "No archived response for this query", body = ErrorRes),
        (status = 500, description = "Archive failure", body = ErrorRes)
    )
)]
/// Fetch the archived model response for a query.
///
/// An identity that is not a canonical record id cannot match a document and is reported as not
/// found.
#[axum::debug_handler]
pub(crate) async fn get_response(
    State(state): State<AppState>,
    Path(query_id): Path<String>,
) -> Result<Json<ResponseRes>, ApiError> {
    let Ok(query_id) = RecordId::parse(&query_id) else {
        return Err(ApiError::NotFound(RESPONSE_NOT_FOUND));
    };

    match state.records.response_for(&query_id)? {
        Some(doc) => Ok(Json(ResponseRes {
            response: response_document(doc),
        })),
        None => Err(ApiError::NotFound(RESPONSE_NOT_FOUND)),
    }
}

#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Aggregate counts and recent queries", body = StatsRes),
        (status = 500, description = "Store failure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn stats(State(state): State<AppState>) -> Result<Json<StatsRes>, ApiError> {
    let stats = state.records.stats(RECENT_QUERIES_LIMIT)?;

    Ok(Json(StatsRes {
        total_queries: stats.total_queries,
        emergency_cases: stats.emergency_cases,
        archived_responses: stats.archived_responses,
        recent_queries: stats.recent.iter().map(recent_query).collect(),
    }))
}
