//! # HTTP Server
//!
//! Combines the lead, auth and observability routers behind CORS and
//! request tracing.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::auth_routes::auth_routes;
use super::config::HttpServerConfig;
use super::lead_routes::lead_routes;
use super::observability_routes::{health_routes, observability_routes};
use crate::auth::TenantDirectory;
use crate::engine::LeadEngine;
use crate::observability::Event;

pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Server bound to the engine's configured address
    pub fn new(engine: Arc<LeadEngine>, directory: Arc<TenantDirectory>) -> Self {
        let config = engine.config().http.clone();
        Self::with_config(config, engine, directory)
    }

    pub fn with_config(
        config: HttpServerConfig,
        engine: Arc<LeadEngine>,
        directory: Arc<TenantDirectory>,
    ) -> Self {
        let router = Self::build_router(&config, engine, directory);
        Self { config, router }
    }

    fn build_router(
        config: &HttpServerConfig,
        engine: Arc<LeadEngine>,
        directory: Arc<TenantDirectory>,
    ) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes(Arc::clone(&engine)))
            .merge(lead_routes(Arc::clone(&engine)))
            .nest("/auth", auth_routes(directory))
            .nest("/observability", observability_routes(engine))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until the process is stopped
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr = self.config.socket_addr().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid socket address {}: {}", self.config.address(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(event = %Event::Serving, addr = %addr);
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
