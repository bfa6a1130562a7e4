//! Runs an [`AllocationPlan`] one `update_debt` transaction at a time.
//!
//! Each task is sent, then awaited, before the next one starts so that debt
//! reductions are mined before the increases that rely on the freed assets.
//! A failed task is recorded and the remaining tasks still run.

use std::future::Future;

use alloy::primitives::{Address, B256, U256};
use tracing::{info, warn};
use vault_core::{AllocationPlan, PlanSummary};

use crate::error::Result;

pub trait DebtUpdater: Sync {
    /// Handle for a sent, not yet mined transaction.
    type Pending: Send;

    /// Send `update_debt` without waiting for it to be mined.
    fn send_update_debt(
        &self,
        strategy: Address,
        target_debt: U256,
    ) -> impl Future<Output = Result<Self::Pending>> + Send;

    fn tx_hash(pending: &Self::Pending) -> B256;

    /// Wait until a sent transaction is mined successfully.
    fn confirm(&self, pending: Self::Pending) -> impl Future<Output = Result<()>> + Send;
}

pub async fn execute_plan<U: DebtUpdater>(updater: &U, plan: &mut AllocationPlan) -> PlanSummary {
    for task in plan.tasks.iter_mut() {
        info!(
            strategy = %task.strategy,
            current_debt = %task.current_debt,
            target_debt = %task.target_debt,
            "Updating strategy debt"
        );

        let pending = match updater
            .send_update_debt(task.strategy, task.target_debt)
            .await
        {
            Ok(pending) => pending,
            Err(e) => {
                warn!(strategy = %task.strategy, error = %e, "Debt update not sent");
                task.mark_failed(e.to_string());
                continue;
            }
        };

        let tx_hash = U::tx_hash(&pending);
        task.mark_submitted(tx_hash);

        match updater.confirm(pending).await {
            Ok(()) => {
                info!(strategy = %task.strategy, tx = %tx_hash, "Debt updated");
                task.mark_confirmed();
            }
            Err(e) => {
                warn!(strategy = %task.strategy, tx = %tx_hash, error = %e, "Debt update failed");
                task.mark_failed(e.to_string());
            }
        }
    }

    let summary = plan.summary();
    info!(
        confirmed = summary.confirmed,
        failed = summary.failed,
        "Rebalance finished"
    );
    summary
}
