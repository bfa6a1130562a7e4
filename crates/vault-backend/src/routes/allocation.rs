//! Allocation planning endpoint

use axum::{extract::State, routing::get, Json, Router};
use tracing::info;
use vault_core::AllocationPlan;

use crate::{
    error::Result,
    routes::AppState,
    services::VaultSource,
    types::PlanResponse,
};

/// Create allocation router
pub fn allocation_router<S: VaultSource>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/allocation/equal", get(equal_plan::<S>))
        .with_state(state)
}

/// Preview the `update_debt` calls an equal rebalance would make.
/// Nothing is sent; executing a plan is done with `vault-ops rebalance-equal`.
///
/// GET /api/allocation/equal
async fn equal_plan<S: VaultSource>(State(state): State<AppState<S>>) -> Result<Json<PlanResponse>> {
    let source = &state.source;
    let (snapshot, strategies) = futures::try_join!(source.snapshot(), source.strategies())?;

    let plan = AllocationPlan::equal(&snapshot, &strategies)?;

    info!(
        per_strategy = %plan.per_strategy,
        tasks = plan.tasks.len(),
        unchanged = plan.unchanged.len(),
        "Planned equal allocation"
    );

    Ok(Json(PlanResponse::new(&plan, source.asset_decimals())))
}
