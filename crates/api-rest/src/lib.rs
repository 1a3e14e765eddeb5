//! # API REST
//!
//! REST API implementation for QuackHub.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for wire types and `quackhub-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod error;
mod handlers;

#[cfg(test)]
mod tests;

use api_shared::{
    AnalyzeReq, AnalyzeRes, ErrorRes, HealthRes, HistoryEntry, HistoryRes, RecentQuery,
    ResponseDocumentRes, ResponseRes, StatsRes, UserInfoRes,
};
use axum::{
    routing::{get, post},
    Router,
};
use quackhub_core::{AnalysisService, RecordsService};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub analysis: Arc<AnalysisService>,
    pub records: Arc<RecordsService>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::analyze,
        handlers::history,
        handlers::get_response,
        handlers::stats,
    ),
    components(schemas(
        HealthRes,
        AnalyzeReq,
        AnalyzeRes,
        ErrorRes,
        HistoryEntry,
        HistoryRes,
        UserInfoRes,
        ResponseDocumentRes,
        ResponseRes,
        RecentQuery,
        StatsRes,
    ))
)]
pub struct ApiDoc;

/// Builds the application router with CORS, request tracing and Swagger UI attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/analyze", post(handlers::analyze))
        .route("/history", get(handlers::history))
        .route("/response/:query_id", get(handlers::get_response))
        .route("/stats", get(handlers::stats))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
