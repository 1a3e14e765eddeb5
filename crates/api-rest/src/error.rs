//! HTTP error mapping.
//!
//! Every failure leaves the server as a JSON [`ErrorRes`]. Downstream failures are reported with
//! their message and a 500, whatever store or upstream produced them.

use api_shared::ErrorRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use quackhub_core::{AnalysisError, TriageError};

pub const MISSING_SYMPTOMS: &str = "Please enter symptoms";
pub const RESPONSE_NOT_FOUND: &str = "Response not found";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Internal(String),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        if err.is_validation() {
            ApiError::BadRequest(MISSING_SYMPTOMS)
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<TriageError> for ApiError {
    fn from(err: TriageError) -> Self {
        match err {
            TriageError::InvalidInput(_) => ApiError::BadRequest(MISSING_SYMPTOMS),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(detail) => {
                tracing::error!(detail, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorRes::new(self.to_string()))).into_response()
    }
}
