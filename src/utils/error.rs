//! Crate-wide API error type and HTTP mapping.
//!
//! Mirrors the error taxonomy the pipeline surfaces to callers:
//! input validation failures, degraded extraction, and fatal
//! search failures each map to a distinct, fixed, user-safe message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InputInvalid(String),

    #[error("search backend unavailable")]
    SearchUnavailable,

    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn input_invalid(msg: impl Into<String>) -> Self {
        Self::InputInvalid(msg.into())
    }

    pub fn internal_error(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InputInvalid(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::SearchUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "search backend unavailable".to_string())
            },
            Self::Internal(err) => {
                tracing::error!("internal error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            },
        };

        let body = Json(json!({ "error": message, "code": status.as_u16() }));
        (status, body).into_response()
    }
}
