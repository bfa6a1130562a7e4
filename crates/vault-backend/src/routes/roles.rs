//! Role bitmask endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use vault_core::{Role, RoleMask};

use crate::{
    error::{BackendError, Result},
    routes::{parse_address, AppState},
    services::VaultSource,
    types::{ComposeRolesRequest, ComposeRolesResponse, RoleEntry, RoleReportResponse},
};

/// Create roles router
pub fn roles_router<S: VaultSource>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/roles", get(role_table))
        .route("/api/roles/compose", post(compose))
        .route("/api/roles/{address}", get(account_roles::<S>))
        .with_state(state)
}

/// Every named role, in bit order
///
/// GET /api/roles
async fn role_table() -> Json<Vec<RoleEntry>> {
    Json(Role::ALL.into_iter().map(RoleEntry::from).collect())
}

/// GET /api/roles/{address}
async fn account_roles<S: VaultSource>(
    State(state): State<AppState<S>>,
    Path(address): Path<String>,
) -> Result<Json<RoleReportResponse>> {
    let account = parse_address(&address)?;
    let mask = state.source.roles_of(account).await?;

    info!(account = %account, mask = %mask, "Role lookup");

    Ok(Json(RoleReportResponse::new(account, mask)))
}

/// Combine role names into the mask to pass to `set_role`
///
/// POST /api/roles/compose
async fn compose(Json(req): Json<ComposeRolesRequest>) -> Result<Json<ComposeRolesResponse>> {
    if req.roles.is_empty() {
        return Err(BackendError::BadRequest("No roles given".to_string()));
    }

    let mask = req
        .roles
        .iter()
        .map(|name| name.parse::<RoleMask>())
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .fold(RoleMask::EMPTY, |acc, mask| acc | mask);

    Ok(Json(ComposeRolesResponse {
        mask: mask.to_string(),
        active_roles: mask.active_roles().into_iter().map(RoleEntry::from).collect(),
        has_all_roles: mask.is_all_roles(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        routes::testing::{get, post_json},
        services::vault_source::fixture::StaticVault,
    };
    use alloy::primitives::Address;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::{collections::HashMap, sync::Arc};

    fn app() -> Router {
        let admin = Address::repeat_byte(0x0a);
        let keeper = Address::repeat_byte(0x0b);
        let roles = HashMap::from([
            (admin, RoleMask::ALL),
            (keeper, RoleMask::union([Role::DebtManager, Role::ReportingManager])),
        ]);

        roles_router(AppState {
            config: Arc::new(Config::default()),
            source: StaticVault {
                roles: Arc::new(roles),
                ..Default::default()
            },
        })
    }

    #[tokio::test]
    async fn test_role_table_lists_all_bits() {
        let (status, body) = get(app(), "/api/roles").await;
        assert_eq!(status, StatusCode::OK);

        let table = body.as_array().unwrap();
        assert_eq!(table.len(), 14);
        assert_eq!(table[0]["value"], 1);
        assert_eq!(table[0]["constant"], "ADD_STRATEGY_MANAGER");
        assert_eq!(table[13]["value"], 8192);
        assert_eq!(table[13]["name"], "Emergency Manager");
    }

    #[tokio::test]
    async fn test_admin_has_all_roles() {
        let uri = format!("/api/roles/{}", Address::repeat_byte(0x0a));
        let (status, body) = get(app(), &uri).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(body["mask"], "16383");
        assert_eq!(body["has_all_roles"], true);
        assert_eq!(body["active_roles"].as_array().unwrap().len(), 14);
        assert_eq!(body["capabilities"]["is_admin"], true);
    }

    #[tokio::test]
    async fn test_keeper_capabilities() {
        let uri = format!("/api/roles/{}", Address::repeat_byte(0x0b));
        let (_, body) = get(app(), &uri).await;

        assert_eq!(body["mask"], "96");
        assert_eq!(body["has_all_roles"], false);
        assert_eq!(body["capabilities"]["can_manage_debt"], true);
        assert_eq!(body["capabilities"]["can_report"], true);
        assert_eq!(body["capabilities"]["can_add_strategy"], false);
        assert_eq!(body["capabilities"]["is_admin"], false);
        assert_eq!(body["has_admin_access"], true);
    }

    #[tokio::test]
    async fn test_unknown_account_has_no_roles() {
        let uri = format!("/api/roles/{}", Address::repeat_byte(0x0c));
        let (_, body) = get(app(), &uri).await;
        assert_eq!(body["mask"], "0");
        assert!(body["active_roles"].as_array().unwrap().is_empty());
        assert_eq!(body["has_admin_access"], false);
    }

    #[tokio::test]
    async fn test_compose_mixed_inputs() {
        let (status, body) = post_json(
            app(),
            "/api/roles/compose",
            json!({"roles": ["DEBT_MANAGER", "max-debt-manager", "1"]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mask"], "193");
        assert_eq!(body["has_all_roles"], false);

        let (_, body) = post_json(app(), "/api/roles/compose", json!({"roles": ["all"]})).await;
        assert_eq!(body["mask"], "16383");
        assert_eq!(body["has_all_roles"], true);
    }

    #[tokio::test]
    async fn test_compose_rejects_unknown_or_empty() {
        let (status, body) =
            post_json(app(), "/api/roles/compose", json!({"roles": ["JANITOR"]})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("JANITOR"));

        let (status, _) = post_json(app(), "/api/roles/compose", json!({"roles": []})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
