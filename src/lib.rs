//! leadscore - multi-tenant lead scoring with per-tenant adaptive retraining

pub mod auth;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod errors;
pub mod feedback;
pub mod http_server;
pub mod model_store;
pub mod notify;
pub mod observability;
pub mod scorer;
pub mod storage;
pub mod tasks;
pub mod tenant;
pub mod trainer;

pub use config::ServiceConfig;
pub use engine::LeadEngine;
pub use errors::{LeadError, LeadResult};
