//! Vault Backend server
//!
//! Serves the dashboard API for the vault deployed on the default network.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use vault_backend::{
    build_app,
    config::Config,
    init_tracing,
    services::{
        provider::{ensure_network, read_provider},
        RpcVaultSource,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(Config::from_env()?);
    let network = config.default_network;

    info!(port = config.port, network = %network, "Starting Vault Backend");
    info!(
        cors_origins = ?config.cors_origins,
        api_keys_configured = !config.api_keys.is_empty(),
        "Configuration loaded"
    );

    let provider = read_provider(&config, network)?;
    ensure_network(&provider, network).await?;
    let vault = config.vault_address(network)?;
    let source = RpcVaultSource::connect(provider, vault).await?;

    let app = build_app(config.clone(), source);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(address = %addr, vault = %vault, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
