//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use stride_core::session::GateError;
use thiserror::Error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            ),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

/// Every gate denial looks the same to the caller.
impl From<GateError> for AppError {
    fn from(_: GateError) -> Self {
        AppError::Forbidden("Admin access required".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_denials_are_indistinguishable() {
        let messages: Vec<String> = [
            GateError::MissingIdentity,
            GateError::TokenTooOld,
            GateError::NotPrivileged,
            GateError::PrivilegeLookupFailed("timed out".into()),
            GateError::SessionUnavailable,
        ]
        .into_iter()
        .map(|e| AppError::from(e).to_string())
        .collect();
        assert!(messages.iter().all(|m| m == &messages[0]));
    }

    #[test]
    fn internal_error_hides_detail() {
        let resp = AppError::Internal("pool exhausted".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
