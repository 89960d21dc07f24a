//! HTTP error bodies
//!
//! Every failed request answers `{"error": <message>, "code": <status>}`.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::errors::LeadError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Handler error type
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(code: u16, message: impl Into<String>) -> ApiError {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: status.as_u16(),
        }),
    )
}

pub fn lead_error(err: LeadError) -> ApiError {
    if err.is_client_error() {
        warn!(error = %err, "request rejected");
    } else {
        error!(error = %err, "request failed");
    }
    api_error(err.status_code(), err.to_string())
}

pub fn auth_error(err: AuthError) -> ApiError {
    if !err.is_client_error() {
        error!(error = %err, "auth request failed");
    }
    api_error(err.status_code(), err.to_string())
}

/// A blocking task that panicked or was cancelled
pub fn task_failed(err: tokio::task::JoinError) -> ApiError {
    error!(error = %err, "request task failed");
    api_error(500, "Internal error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_error_mapping() {
        let (status, Json(body)) = lead_error(LeadError::TenantNotFound("acme".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, 404);
        assert!(body.error.contains("acme"));
    }

    #[test]
    fn test_auth_error_mapping() {
        let (status, Json(body)) = auth_error(AuthError::InvalidCredentials);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error, "Invalid credentials");
    }

    #[test]
    fn test_unknown_code_becomes_500() {
        let (status, Json(body)) = api_error(42, "odd");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, 500);
    }
}
