//! Lead HTTP Routes
//!
//! Scoring, confirmation and dashboard endpoints. Engine calls do file I/O
//! and model fitting, so each runs on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{api_error, lead_error, task_failed, ApiError};
use crate::dashboard::DashboardSummary;
use crate::engine::LeadEngine;
use crate::errors::LeadError;
use crate::scorer::{RawSignals, ScoreOutcome};
use crate::storage::{Outcome, TimeWindow};

/// Lead routes with shared engine
pub fn lead_routes(engine: Arc<LeadEngine>) -> Router {
    Router::new()
        .route("/score", post(score_handler))
        .route("/confirm", post(confirm_handler))
        .route("/dashboard", get(dashboard_handler))
        .with_state(engine)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default, alias = "client_id")]
    pub tenant_id: Option<String>,
    #[serde(flatten)]
    pub signals: RawSignals,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ScoreResponse {
    pub lead_id: u64,
    /// Rounded to two decimals
    pub probability: f64,
    pub is_hot: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_link: Option<String>,
}

impl From<ScoreOutcome> for ScoreResponse {
    fn from(outcome: ScoreOutcome) -> Self {
        Self {
            lead_id: outcome.lead_id.value(),
            probability: round2(outcome.probability),
            is_hot: u8::from(outcome.is_hot),
            model_version: outcome.model_version.map(|v| v.value()),
            notification_link: outcome.notification_link,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default, alias = "client_id")]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub lead_id: Option<u64>,
    /// Defaults to `converted`
    #[serde(default)]
    pub outcome: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub status: &'static str,
    pub lead_id: u64,
    pub outcome: Outcome,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default, alias = "client_id")]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub include_leads: bool,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn require_tenant(tenant_id: Option<String>) -> Result<String, ApiError> {
    match tenant_id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(lead_error(LeadError::validation("tenant_id is required"))),
    }
}

// ==================
// Handlers
// ==================

async fn score_handler(
    State(engine): State<Arc<LeadEngine>>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| api_error(400, e.body_text()))?;
    let tenant_id = require_tenant(request.tenant_id)?;
    let signals = request.signals;

    let outcome = tokio::task::spawn_blocking(move || engine.score_raw(&tenant_id, &signals))
        .await
        .map_err(task_failed)?
        .map_err(lead_error)?;

    Ok(Json(ScoreResponse::from(outcome)))
}

async fn confirm_handler(
    State(engine): State<Arc<LeadEngine>>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| api_error(400, e.body_text()))?;
    let tenant_id = require_tenant(request.tenant_id)?;
    let lead_id = request
        .lead_id
        .ok_or_else(|| lead_error(LeadError::validation("lead_id is required")))?;
    let outcome = match request.outcome.as_deref() {
        None => Outcome::Converted,
        Some(raw) => raw.parse::<Outcome>().map_err(lead_error)?,
    };
    if !outcome.is_terminal() {
        return Err(lead_error(LeadError::validation(
            "outcome must be 'converted' or 'not_converted'",
        )));
    }

    let confirmation =
        tokio::task::spawn_blocking(move || engine.confirm(&tenant_id, lead_id, outcome))
            .await
            .map_err(task_failed)?
            .map_err(lead_error)?;

    Ok(Json(ConfirmResponse {
        status: "ok",
        lead_id: confirmation.lead_id.value(),
        outcome: confirmation.outcome,
    }))
}

async fn dashboard_handler(
    State(engine): State<Arc<LeadEngine>>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<DashboardSummary>), ApiError> {
    let Query(query) = query.map_err(|e| api_error(400, e.body_text()))?;
    let tenant_id = require_tenant(query.tenant_id)?;
    let window = TimeWindow::new(query.since, query.until);
    let include_leads = query.include_leads;

    let summary =
        tokio::task::spawn_blocking(move || engine.dashboard(&tenant_id, &window, include_leads))
            .await
            .map_err(task_failed)?
            .map_err(lead_error)?;

    Ok((StatusCode::OK, Json(summary)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_store::ModelVersion;
    use crate::storage::SampleId;

    #[test]
    fn test_score_response_rounds_and_flags() {
        let response = ScoreResponse::from(ScoreOutcome {
            lead_id: SampleId(3),
            probability: 0.83456,
            is_hot: true,
            model_version: Some(ModelVersion(2)),
            notification_link: None,
        });
        assert_eq!(response.probability, 0.83);
        assert_eq!(response.is_hot, 1);
        assert_eq!(response.model_version, Some(2));

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("notification_link").is_none());
    }

    #[test]
    fn test_score_request_accepts_client_id_alias() {
        let request: ScoreRequest = serde_json::from_str(
            r#"{"client_id": "acme", "time_on_site": 5, "pages_visited": 1, "clicked_price": 0}"#,
        )
        .unwrap();
        assert_eq!(request.tenant_id.as_deref(), Some("acme"));
        assert!(request.signals.parse().is_ok());
    }

    #[test]
    fn test_require_tenant() {
        assert!(require_tenant(None).is_err());
        assert!(require_tenant(Some("  ".into())).is_err());
        assert_eq!(require_tenant(Some("acme".into())).unwrap(), "acme");
    }
}
