//! Post-deployment configuration: give the admin every role and set the
//! deposit limit.

use alloy::primitives::{Address, B256};
use serde::Serialize;
use tracing::{error, info};
use vault_core::{DepositLimit, RoleMask, RoleUpdate};

use crate::{
    error::Result,
    services::{operator::VaultOperator, vault_source::VaultSource},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepOutcome {
    AlreadySet,
    Applied { tx_hash: B256 },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigureReport {
    pub admin: Address,
    pub roles: StepOutcome,
    pub deposit_limit: StepOutcome,
}

/// Update needed to make `current` the full role set, if any.
pub fn admin_role_update(current: RoleMask) -> Option<RoleUpdate> {
    if current.is_all_roles() {
        None
    } else {
        Some(RoleUpdate::Set(RoleMask::ALL))
    }
}

/// Granting roles is required; a failed deposit-limit update is logged
/// and reported but does not fail the run.
pub async fn configure_vault(
    operator: &VaultOperator,
    admin: Address,
    limit: DepositLimit,
) -> Result<ConfigureReport> {
    info!(admin = %admin, "Granting admin roles");
    let current = operator.source().roles_of(admin).await?;

    let roles = match admin_role_update(current) {
        None => {
            info!(admin = %admin, "Admin already has all roles");
            StepOutcome::AlreadySet
        }
        Some(update) => {
            let (tx_hash, _) = operator.update_roles(admin, update).await?;
            StepOutcome::Applied { tx_hash }
        }
    };

    info!(limit = %limit.format(operator.decimals()), "Setting deposit limit");
    let deposit_limit = match operator.set_deposit_limit(limit).await {
        Ok(tx_hash) => StepOutcome::Applied { tx_hash },
        Err(e) => {
            error!(error = %e, "Failed to set deposit limit");
            StepOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    Ok(ConfigureReport {
        admin,
        roles,
        deposit_limit,
    })
}
