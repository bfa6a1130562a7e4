//! Vault overview, strategy and position endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::info;
use vault_core::{can_allocate, max_allocatable, parse_amount, AllocationBreakdown};

use crate::{
    error::Result,
    routes::{parse_address, AppState},
    services::VaultSource,
    types::{
        AmountView, HeadroomView, PositionQuery, PositionResponse, StrategyResponse,
        VaultOverviewResponse,
    },
};

/// Create vault router
pub fn vault_router<S: VaultSource>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/vault", get(overview::<S>))
        .route("/api/strategies", get(strategies::<S>))
        .route("/api/positions/{address}", get(position::<S>))
        .with_state(state)
}

/// Vault totals, deposit cap, allocation headroom and asset breakdown
///
/// GET /api/vault
async fn overview<S: VaultSource>(
    State(state): State<AppState<S>>,
) -> Result<Json<VaultOverviewResponse>> {
    let source = &state.source;
    let decimals = source.asset_decimals();
    let (snapshot, strategies, role_manager) = futures::try_join!(
        source.snapshot(),
        source.strategies(),
        source.role_manager()
    )?;

    let headroom = max_allocatable(&strategies, snapshot.total_debt);
    let breakdown = AllocationBreakdown::compute(snapshot.total_assets, &strategies);

    info!(
        vault = %source.vault_address(),
        strategies = strategies.len(),
        overdrawn = headroom.is_overdrawn(),
        "Vault overview"
    );

    Ok(Json(VaultOverviewResponse {
        vault: source.vault_address(),
        network: state.config.default_network.to_string(),
        role_manager,
        total_assets: AmountView::new(snapshot.total_assets, decimals),
        total_supply: AmountView::new(snapshot.total_supply, decimals),
        total_debt: AmountView::new(snapshot.total_debt, decimals),
        total_idle: AmountView::new(snapshot.total_idle, decimals),
        deposit_limit: snapshot.deposit_limit.format(decimals),
        deposit_headroom: snapshot
            .deposit_headroom()
            .map(|room| AmountView::new(room, decimals)),
        strategy_count: strategies.len(),
        max_allocatable: HeadroomView::new(headroom, decimals),
        can_allocate: AmountView::new(can_allocate(snapshot.total_idle, headroom), decimals),
        breakdown: VaultOverviewResponse::breakdown_views(&breakdown, decimals),
    }))
}

/// GET /api/strategies
async fn strategies<S: VaultSource>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<StrategyResponse>>> {
    let source = &state.source;
    let decimals = source.asset_decimals();
    let (snapshot, strategies) = futures::try_join!(source.snapshot(), source.strategies())?;

    Ok(Json(
        strategies
            .iter()
            .map(|s| StrategyResponse::new(s, snapshot.total_assets, decimals))
            .collect(),
    ))
}

/// Holdings of one account, plus what `?amount=` would allow
///
/// GET /api/positions/{address}
async fn position<S: VaultSource>(
    State(state): State<AppState<S>>,
    Path(address): Path<String>,
    Query(query): Query<PositionQuery>,
) -> Result<Json<PositionResponse>> {
    let account = parse_address(&address)?;
    let decimals = state.source.asset_decimals();
    let amount = query
        .amount
        .as_deref()
        .map(|text| parse_amount(text, decimals))
        .transpose()?;

    let position = state.source.position_of(account).await?;

    Ok(Json(PositionResponse::new(account, &position, amount, decimals)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        routes::testing::get,
        services::vault_source::fixture::StaticVault,
    };
    use alloy::primitives::{Address, U256};
    use axum::http::StatusCode;
    use std::{collections::HashMap, sync::Arc};
    use vault_core::{DepositLimit, StrategyAllocation, UserPosition, VaultSnapshot};

    fn usdc(amount: u64) -> U256 {
        U256::from(amount) * U256::from(1_000_000u64)
    }

    fn sample_vault() -> StaticVault {
        let user = Address::repeat_byte(0xaa);
        let position = UserPosition {
            shares: usdc(100),
            assets: usdc(100),
            asset_balance: usdc(50),
            allowance: usdc(20),
        };

        StaticVault {
            address: Address::repeat_byte(0x11),
            role_manager: Address::repeat_byte(0x0a),
            snapshot: VaultSnapshot {
                total_assets: usdc(1000),
                total_supply: usdc(1000),
                total_debt: usdc(400),
                total_idle: usdc(600),
                deposit_limit: DepositLimit::Limited(usdc(10_000)),
            },
            strategies: vec![
                StrategyAllocation {
                    address: Address::repeat_byte(0x01),
                    activation: U256::from(1_700_000_000u64),
                    current_debt: usdc(400),
                    max_debt: usdc(500),
                    ..Default::default()
                },
                StrategyAllocation {
                    address: Address::repeat_byte(0x02),
                    activation: U256::from(1_700_000_000u64),
                    max_debt: usdc(300),
                    ..Default::default()
                },
            ],
            positions: Arc::new(HashMap::from([(user, position)])),
            ..Default::default()
        }
    }

    fn app(vault: StaticVault) -> Router {
        vault_router(AppState {
            config: Arc::new(Config::default()),
            source: vault,
        })
    }

    #[tokio::test]
    async fn test_overview_totals_and_headroom() {
        let (status, body) = get(app(sample_vault()), "/api/vault").await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(body["network"], "sepolia");
        assert_eq!(
            body["role_manager"].as_str().unwrap().parse::<Address>().unwrap(),
            Address::repeat_byte(0x0a)
        );
        assert_eq!(body["total_assets"]["formatted"], "1000");
        assert_eq!(body["total_assets"]["raw"], "1000000000");
        assert_eq!(body["deposit_limit"], "10000");
        assert_eq!(body["deposit_headroom"]["formatted"], "9000");
        assert_eq!(body["strategy_count"], 2);

        // caps 800, debt 400
        assert_eq!(body["max_allocatable"]["kind"], "available");
        assert_eq!(body["max_allocatable"]["amount"]["formatted"], "400");
        assert_eq!(body["can_allocate"]["formatted"], "400");
    }

    #[tokio::test]
    async fn test_overview_breakdown_skips_empty_strategies() {
        let (_, body) = get(app(sample_vault()), "/api/vault").await;
        let slices = body["breakdown"].as_array().unwrap();

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0]["label"], "Strategy 1");
        assert_eq!(slices[0]["percent"], "40.0");
        assert_eq!(slices[1]["strategy"], serde_json::Value::Null);
        assert_eq!(slices[1]["amount"]["formatted"], "600");
        assert_eq!(slices[1]["percent"], "60.0");
    }

    #[tokio::test]
    async fn test_overview_unlimited_and_overdrawn() {
        let mut vault = sample_vault();
        vault.snapshot.deposit_limit = DepositLimit::Unlimited;
        vault.strategies[0].max_debt = usdc(100);
        vault.strategies[1].max_debt = U256::ZERO;

        let (_, body) = get(app(vault), "/api/vault").await;
        assert_eq!(body["deposit_limit"], "unlimited");
        assert_eq!(body["deposit_headroom"], serde_json::Value::Null);
        assert_eq!(body["max_allocatable"]["kind"], "overdrawn");
        assert_eq!(body["max_allocatable"]["amount"]["formatted"], "300");
        assert_eq!(body["can_allocate"]["raw"], "0");
    }

    #[tokio::test]
    async fn test_strategies_list() {
        let (status, body) = get(app(sample_vault()), "/api/strategies").await;
        assert_eq!(status, StatusCode::OK);

        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["current_debt"]["formatted"], "400");
        assert_eq!(list[0]["percent_of_assets"], "40.0");
        assert_eq!(list[0]["is_active"], true);
        assert_eq!(list[1]["current_debt"]["formatted"], "0");
        assert_eq!(list[1]["max_debt"]["formatted"], "300");
    }

    #[tokio::test]
    async fn test_position_with_amount_checks() {
        let uri = format!("/api/positions/{}?amount=30", Address::repeat_byte(0xaa));
        let (status, body) = get(app(sample_vault()), &uri).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(body["shares"]["formatted"], "100");
        assert_eq!(body["checks"]["amount"]["raw"], "30000000");
        assert_eq!(body["checks"]["needs_approval"], true);
        assert_eq!(body["checks"]["can_deposit"], false);
        assert_eq!(body["checks"]["can_withdraw"], true);
    }

    #[tokio::test]
    async fn test_position_unknown_account_is_empty() {
        let uri = format!("/api/positions/{}", Address::repeat_byte(0xbb));
        let (status, body) = get(app(sample_vault()), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assets"]["raw"], "0");
        assert_eq!(body["checks"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_position_rejects_bad_input() {
        let (status, body) = get(app(sample_vault()), "/api/positions/0xnothex").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let uri = format!(
            "/api/positions/{}?amount=1.0000001",
            Address::repeat_byte(0xaa)
        );
        let (status, _) = get(app(sample_vault()), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rpc_failure_is_bad_gateway() {
        let vault = StaticVault {
            failure: Some("connection refused".to_string()),
            ..sample_vault()
        };
        let (status, body) = get(app(vault), "/api/vault").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "RPC_ERROR");
    }
}
