use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for RelayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => {
                RelayError::Unauthorized("Invalid or expired token".to_string())
            }
            other => RelayError::Internal(format!("Auth provider error: {other}")),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RelayError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            RelayError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            RelayError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
