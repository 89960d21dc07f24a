//! Auth HTTP Routes
//!
//! Operator registration and login against the tenant directory.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};

use super::errors::{api_error, auth_error, task_failed, ApiError};
use crate::auth::TenantDirectory;

/// Auth routes with shared directory
pub fn auth_routes(directory: Arc<TenantDirectory>) -> Router {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .with_state(directory)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "client_id")]
    pub tenant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TenantResponse {
    pub tenant_id: String,
    pub email: String,
}

// ==================
// Handlers
// ==================

async fn register_handler(
    State(directory): State<Arc<TenantDirectory>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TenantResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| api_error(400, e.body_text()))?;

    // Argon2 is CPU-bound
    let credential = tokio::task::spawn_blocking(move || {
        directory.register(&request.email, &request.password, &request.tenant_id)
    })
    .await
    .map_err(task_failed)?
    .map_err(auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(TenantResponse {
            tenant_id: credential.tenant_id,
            email: credential.email,
        }),
    ))
}

async fn login_handler(
    State(directory): State<Arc<TenantDirectory>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TenantResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| api_error(400, e.body_text()))?;
    let email = request.email.trim().to_lowercase();

    let tenant_id = {
        let email = email.clone();
        tokio::task::spawn_blocking(move || directory.authenticate(&email, &request.password))
            .await
            .map_err(task_failed)?
            .map_err(auth_error)?
    };

    Ok(Json(TenantResponse { tenant_id, email }))
}
