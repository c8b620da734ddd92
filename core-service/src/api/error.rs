//! API error handling.
//!
//! Errors render either as a JSON body or, for the routes whose clients
//! expect it, as a short plain-text message. Internal details are logged,
//! never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_auth::AuthError;
use serde::Serialize;

/// Body of a plain-text 500 from the authorization callback.
pub const AUTH_FAILED_MESSAGE: &str = "Error during authentication";

/// Body of a plain-text 500 from the file listing.
pub const LIST_FAILED_MESSAGE: &str = "Error fetching files";

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Text,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    format: BodyFormat,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            format: BodyFormat::Json,
        }
    }

    /// Error whose body is `message` as `text/plain`.
    pub fn plain(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code: String::new(),
            message: message.into(),
            format: BodyFormat::Text,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.format {
            BodyFormat::Text => (self.status, self.message).into_response(),
            BodyFormat::Json => {
                let body = ApiErrorResponse {
                    code: self.code,
                    message: self.message,
                };
                (self.status, Json(body)).into_response()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AccountOutOfRange { index, .. } => {
                ApiError::not_found(format!("Account {} does not exist", index))
            }
            other => {
                tracing::error!(error = %other, "Authentication error");
                ApiError::internal("Authentication error")
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use core_auth::AccountId;

    async fn body_of(error: ApiError) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_out_of_range_is_json_404() {
        let (status, body) = body_of(
            AuthError::AccountOutOfRange {
                index: 99,
                count: 15,
            }
            .into(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Account 99 does not exist");
    }

    #[tokio::test]
    async fn test_other_auth_errors_hide_details() {
        let (status, body) = body_of(
            AuthError::NotAuthenticated {
                account: AccountId::new(4),
            }
            .into(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("account5"));
    }

    #[tokio::test]
    async fn test_plain_body() {
        let (status, body) = body_of(ApiError::plain(
            StatusCode::INTERNAL_SERVER_ERROR,
            LIST_FAILED_MESSAGE,
        ))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Error fetching files");
    }
}
