//! Liveness endpoint, exempt from API key auth

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;

use crate::{config::Config, types::HealthResponse};

pub fn health_router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(config)
}

/// Reports the build version and the network the dashboard reads from.
/// Does not touch the RPC endpoint.
async fn health(State(config): State<Arc<Config>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: config.default_network.to_string(),
        timestamp: Utc::now().timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::get;
    use axum::http::StatusCode;
    use vault_core::Network;

    #[tokio::test]
    async fn test_health_reports_version_and_network() {
        let (status, body) = get(health_router(Arc::new(Config::default())), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["network"], "sepolia");
        assert!(body["timestamp"].as_i64().unwrap() > 0);

        let config = Config {
            default_network: Network::Mainnet,
            ..Config::default()
        };
        let (_, body) = get(health_router(Arc::new(config)), "/health").await;
        assert_eq!(body["network"], "mainnet");
    }
}
