//! Liveness and counters
//!
//! `/health` answers without touching any tenant. `/observability/metrics`
//! returns the process counters alongside the tenants loaded so far.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::config::StorageBackend;
use crate::engine::LeadEngine;
use crate::observability::MetricsSnapshot;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: StorageBackend,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    pub tenants_loaded: usize,
}

/// `/health` and `/metrics`, nested under /observability
pub fn observability_routes(engine: Arc<LeadEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(engine)
}

/// Root-level `/health` for load balancers
pub fn health_routes(engine: Arc<LeadEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(engine)
}

async fn health(State(engine): State<Arc<LeadEngine>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: engine.config().storage.backend,
    })
}

async fn metrics(State(engine): State<Arc<LeadEngine>>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        counters: engine.metrics().snapshot(),
        tenants_loaded: engine.registry().loaded_tenants().len(),
    })
}
