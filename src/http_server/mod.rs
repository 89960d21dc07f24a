//! # HTTP Server Module
//!
//! Axum API over the lead engine.
//!
//! # Endpoints
//!
//! - `POST /score` - Record and score a lead
//! - `POST /confirm` - Confirm a lead's outcome
//! - `GET /dashboard` - Aggregated tenant counts
//! - `POST /auth/register`, `POST /auth/login` - Operator credentials
//! - `GET /health`, `GET /observability/metrics` - Health and counters

mod auth_routes;
mod config;
mod errors;
mod lead_routes;
mod observability_routes;
mod server;

pub use config::HttpServerConfig;
pub use errors::ErrorResponse;
pub use lead_routes::{ConfirmRequest, DashboardQuery, ScoreRequest, ScoreResponse};
pub use server::HttpServer;
