//! Vault Backend
//!
//! Read-only dashboard API for a multi-strategy ERC-4626 vault, plus the
//! chain services used by the `vault-ops` operator CLI.

pub mod config;
pub mod contracts;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use routes::{allocation_router, health_router, roles_router, vault_router, AppState};
use services::VaultSource;

/// Install the global subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vault_backend=info,vault_ops=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Assemble the dashboard router with auth, CORS, body limit and tracing.
pub fn build_app<S: VaultSource>(config: Arc<Config>, source: S) -> Router {
    let state = AppState {
        config: config.clone(),
        source,
    };
    let cors = build_cors_layer(&config);

    Router::new()
        .merge(health_router(config.clone()))
        .merge(vault_router(state.clone()))
        .merge(roles_router(state.clone()))
        .merge(allocation_router(state))
        .layer(middleware::from_fn_with_state(config, api_key_middleware))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(64 * 1024)) // 64KB max request body
        .layer(TraceLayer::new_for_http())
}

/// Build CORS layer from config
fn build_cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-api-key"),
        ])
}

/// API key authentication middleware
async fn api_key_middleware(
    State(config): State<Arc<Config>>,
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // Skip auth for health check
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    // No keys configured: development mode
    if config.api_keys.is_empty() {
        return Ok(next.run(request).await);
    }

    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Request missing API key");
            StatusCode::UNAUTHORIZED
        })?;

    // Never log the key itself
    if !config.api_keys.iter().any(|key| key == api_key) {
        warn!("Invalid API key provided");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
