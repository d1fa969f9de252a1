//! Error taxonomy for the API and persistence layers.
//!
//! Handlers return [`ApiError`] explicitly; the persistence seam returns
//! [`StoreError`] which handlers map declaratively (`NotFound` -> 404,
//! anything backend-side -> 500). Internal failures are logged server-side
//! in full and surface to clients as a generic body only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Persistence-layer error. The store never uses errors for control flow:
/// a missing row is a value (`NotFound`), not an exception.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// API-facing error taxonomy. Maps one-to-one onto HTTP statuses.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error")]
    Validation { details: Vec<String> },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Too Many Requests")]
    RateLimited,

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn validation(details: Vec<String>) -> Self {
        ApiError::Validation { details }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Not found".to_string()),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Backend(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation { details } => json!({
                "error": "Validation error",
                "details": details,
            }),
            ApiError::Internal(err) => {
                // Full chain stays server-side; clients get the generic body.
                tracing::error!(error = ?err, "internal server error");
                json!({ "error": "Internal Server Error" })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Result alias used by route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_404() {
        let err: ApiError = StoreError::NotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_is_a_400() {
        assert_eq!(
            ApiError::conflict("cannot delete last admin").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn validation_body_carries_details() {
        let resp = ApiError::validation(vec!["siteId is required".into()]).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
