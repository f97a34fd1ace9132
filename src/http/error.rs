//! Mapping of service failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::customization::{SubmissionError, ValidationError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Validation(v) => ApiError::Validation(v),
            SubmissionError::NoActiveProduct => ApiError::BadRequest(e.to_string()),
        }
    }
}

fn unavailable(message: String, transient: bool) -> Response {
    // Transient failures invite a manual retry; anything else is a bad upstream answer.
    let status = if transient {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::BAD_GATEWAY
    };
    let body = json!({
        "error": "unavailable",
        "message": message,
        "retryable": transient,
    });
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::Catalog(CatalogError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "not_found", "message": message, "id": id })),
            )
                .into_response(),
            ApiError::Catalog(CatalogError::Unavailable(e)) => unavailable(message, e.last.is_transient()),
            ApiError::Cart(CartError::Unavailable(e)) => unavailable(message, e.last.is_transient()),
            ApiError::Cart(CartError::Unconfirmed(_)) => unavailable(message, false),
            ApiError::Validation(e) => {
                tracing::debug!(issues = e.issues.len(), "Rejected submission");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "error": "validation", "message": message, "issues": e.issues })),
                )
                    .into_response()
            }
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "bad_request", "message": message })),
            )
                .into_response(),
        }
    }
}
