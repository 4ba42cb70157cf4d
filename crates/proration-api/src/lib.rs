//! Proration API
//!
//! HTTP boundary and command line front end for the proration engine. The
//! boundary validates and marshals requests into the engine and renders the
//! mapping it returns; it owns no allocation logic of its own.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod tracing_setup;
pub mod types;
pub mod validation;

use config::{CorsConfig, ProrationConfig};

/// Shared, read-only application state
#[derive(Debug)]
pub struct AppState {
    pub start_time: DateTime<Utc>,
    pub config: ProrationConfig,
}

impl AppState {
    pub fn new(config: ProrationConfig) -> Self {
        Self { start_time: Utc::now(), config }
    }

    pub fn elapsed(&self) -> Duration {
        (Utc::now() - self.start_time).to_std().unwrap_or_default()
    }
}

/// Build the router with CORS, request tracing, body limits and panic recovery.
pub fn create_app(config: ProrationConfig) -> anyhow::Result<Router> {
    let cors = cors_layer(&config.cors)?;
    let body_limit = config.max_body_bytes();
    info!(
        allowed_origins = ?config.cors.allowed_origins,
        body_limit,
        max_claims = config.limits.max_claims_per_request,
        "Building HTTP application"
    );

    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        .route("/", get(handlers::service_info))
        .route("/api", get(handlers::service_info))
        .route("/api/health", get(handlers::health))
        .route("/api/prorate", post(handlers::prorate))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CatchPanicLayer::custom(handlers::handle_panic))
                .layer(RequestBodyLimitLayer::new(body_limit)),
        );

    Ok(app)
}

fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    // Credentials are allowed, which rules out a wildcard origin.
    if config.allowed_origins.iter().any(|origin| origin == "*") {
        anyhow::bail!("CORS origin '*' cannot be combined with credentials; list origins explicitly");
    }
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unusable_cors_origin() {
        let config = CorsConfig { allowed_origins: vec!["http://bad\norigin".to_string()] };
        assert!(cors_layer(&config).is_err());

        let config = CorsConfig { allowed_origins: vec!["*".to_string()] };
        assert!(cors_layer(&config).is_err());
    }

    #[test]
    fn builds_with_defaults() {
        assert!(create_app(ProrationConfig::default()).is_ok());
    }
}
