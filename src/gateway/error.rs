use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::search::SearchError;

/// Errors surfaced to API callers. Validation failures keep their message;
/// everything else collapses to a generic internal error so no store or
/// model details leak.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("internal server error")]
    Internal,
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        if err.is_validation() {
            ApiError::Validation(err.to_string())
        } else {
            tracing::error!(error = %err, "Search pipeline failed");
            ApiError::Internal
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
