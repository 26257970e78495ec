//! Server error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use api_protocol::{FieldError, error_codes};

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input, with per-field detail.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Missing or invalid session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed.
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Request conflicts with current state (duplicates, already-friends,
    /// self-block).
    #[error("{0}")]
    Conflict(String),

    /// Referenced entity absent. Served as HTTP 400, not 404, matching
    /// the platform's observed behavior.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The recipient has blocked the sender.
    #[error("Recipient has blocked the sender")]
    Blocked,

    /// Message text was empty.
    #[error("Message text must not be empty")]
    EmptyMessage,

    /// Username/password mismatch. The message never says which.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Document store error.
    #[error("Store error: {0}")]
    Store(#[from] doc_store::DocStoreError),

    /// Authentication subsystem error.
    #[error("Auth error: {0}")]
    Auth(#[from] auth::AuthError),

    /// Message cipher error.
    #[error("Cipher error: {0}")]
    Cipher(#[from] cipher::CipherError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Session failures get a plain-text 401 body, not JSON.
        if matches!(
            &self,
            ApiError::Unauthorized
                | ApiError::Auth(auth::AuthError::InvalidSession)
                | ApiError::Auth(auth::AuthError::InvalidToken)
        ) {
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }

        let (status, error_code, message) = match &self {
            ApiError::Validation(details) => {
                let body = json!({
                    "error": {
                        "code": error_codes::INVALID_REQUEST,
                        "message": "Validation failed",
                        "details": details,
                    }
                });
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, error_codes::PERMISSION_DENIED, msg.clone())
            }
            ApiError::Conflict(msg) => {
                (StatusCode::BAD_REQUEST, error_codes::CONFLICT, msg.clone())
            }
            ApiError::NotFound(msg) => {
                (StatusCode::BAD_REQUEST, error_codes::RESOURCE_NOT_FOUND, msg.clone())
            }
            ApiError::Blocked => (
                StatusCode::BAD_REQUEST,
                error_codes::BLOCKED,
                "Recipient has blocked the sender".to_string(),
            ),
            ApiError::EmptyMessage => (
                StatusCode::BAD_REQUEST,
                error_codes::EMPTY_MESSAGE,
                "Message text must not be empty".to_string(),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_REQUEST,
                "Invalid username or password".to_string(),
            ),
            ApiError::Store(e) if e.is_not_found() => {
                (StatusCode::BAD_REQUEST, error_codes::RESOURCE_NOT_FOUND, e.to_string())
            }
            ApiError::Store(e) if e.is_already_exists() => {
                (StatusCode::BAD_REQUEST, error_codes::CONFLICT, e.to_string())
            }
            ApiError::Store(e) => {
                tracing::error!(error = %e, "Document store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Auth(e) => {
                tracing::error!(error = %e, "Auth subsystem failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Cipher(e) => {
                tracing::error!(error = %e, "Message cipher failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Unauthorized => unreachable!("handled above"),
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": message,
                "messages": [message],
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for server operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_400() {
        let response = ApiError::NotFound("Project not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unauthorized_is_plain_text() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/plain"));
    }

    #[test]
    fn test_store_not_found_maps_to_400() {
        let error = ApiError::Store(doc_store::DocStoreError::not_found("Project", "x"));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
