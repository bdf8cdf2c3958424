//! Error types for the API layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that
//! converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body uses the `{"success": false, "message": ...}` envelope the
//! client expects.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pulse_core::CoreError;

/// Errors that can occur while handling an API request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request payload failed validation.
    #[error("{0}")]
    Validation(String),

    /// The requested resource was not found.
    #[error("{0}")]
    NotFound(String),

    /// The caller lacks permission for this operation.
    #[error("{0}")]
    Forbidden(String),

    /// The caller presented no session or an invalid one.
    #[error("{0}")]
    Unauthenticated(String),

    /// An internal error occurred. The message is logged, never sent.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::NotFound(msg) => Self::NotFound(msg),
            CoreError::Forbidden(msg) => Self::Forbidden(msg),
            CoreError::Unauthenticated(msg) => Self::Unauthenticated(msg),
            CoreError::Storage(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(%detail, "request failed with internal error");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "success": false,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_expected_statuses() {
        let cases = [
            (CoreError::Validation("bad".to_owned()), StatusCode::BAD_REQUEST),
            (CoreError::NotFound("gone".to_owned()), StatusCode::NOT_FOUND),
            (CoreError::Forbidden("no".to_owned()), StatusCode::FORBIDDEN),
            (
                CoreError::Unauthenticated("who".to_owned()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                CoreError::Storage("boom".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (core, expected) in cases {
            assert_eq!(ApiError::from(core).status(), expected);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let response = ApiError::Internal("connection string".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
