//! Debt allocation arithmetic and the ordered task list used to rebalance
//! the vault across its strategies.
//!
//! All amounts are base units of the asset (10^-6 USDC). Division truncates,
//! so any remainder of an equal split stays idle in the vault and is never
//! rounded up into a target the vault cannot fund.

use std::num::NonZeroUsize;

use alloy_primitives::{Address, B256, U256};
use serde::Serialize;

use crate::{
    error::{CoreError, Result},
    state::{StrategyAllocation, VaultSnapshot},
};

/// `total_assets / strategy_count`, truncated.
pub fn equal_split(total_assets: U256, strategy_count: NonZeroUsize) -> U256 {
    total_assets / U256::from(strategy_count.get())
}

/// Signed difference between the strategies' combined caps and current debt.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum Headroom {
    /// Caps exceed debt by this much
    Available(U256),
    /// Caps were lowered below already-allocated debt by this much
    Overdrawn(U256),
}

impl Headroom {
    /// Usable capacity: an overdrawn vault has none.
    pub fn capacity(self) -> U256 {
        match self {
            Headroom::Available(amount) => amount,
            Headroom::Overdrawn(_) => U256::ZERO,
        }
    }

    pub fn is_overdrawn(self) -> bool {
        matches!(self, Headroom::Overdrawn(_))
    }
}

/// `Σ max_debt − total_debt`. Caps are summed saturating, since a strategy
/// with an uncapped `max_debt` is stored as `U256::MAX`.
pub fn max_allocatable(strategies: &[StrategyAllocation], total_debt: U256) -> Headroom {
    let caps = strategies
        .iter()
        .fold(U256::ZERO, |acc, s| acc.saturating_add(s.max_debt));

    if caps >= total_debt {
        Headroom::Available(caps - total_debt)
    } else {
        Headroom::Overdrawn(total_debt - caps)
    }
}

/// `min(total_idle, headroom)`, never below zero.
pub fn can_allocate(total_idle: U256, headroom: Headroom) -> U256 {
    total_idle.min(headroom.capacity())
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtChange {
    Increase,
    Decrease,
    Unchanged,
}

/// Lifecycle of one `update_debt` transaction.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Submitted { tx_hash: B256 },
    Confirmed { tx_hash: B256 },
    Failed { reason: String },
}

/// Moving one strategy's debt to a new target.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct AllocationTask {
    pub strategy: Address,
    pub current_debt: U256,
    pub target_debt: U256,
    /// Target was lowered to the strategy's `max_debt`
    pub capped: bool,
    pub status: TaskStatus,
}

impl AllocationTask {
    pub fn new(strategy: &StrategyAllocation, desired: U256) -> Self {
        let capped = desired > strategy.max_debt;
        Self {
            strategy: strategy.address,
            current_debt: strategy.current_debt,
            target_debt: desired.min(strategy.max_debt),
            capped,
            status: TaskStatus::Pending,
        }
    }

    pub fn change(&self) -> DebtChange {
        match self.target_debt.cmp(&self.current_debt) {
            std::cmp::Ordering::Greater => DebtChange::Increase,
            std::cmp::Ordering::Less => DebtChange::Decrease,
            std::cmp::Ordering::Equal => DebtChange::Unchanged,
        }
    }

    pub fn mark_submitted(&mut self, tx_hash: B256) {
        self.status = TaskStatus::Submitted { tx_hash };
    }

    /// No-op unless the task was submitted.
    pub fn mark_confirmed(&mut self) {
        if let TaskStatus::Submitted { tx_hash } = self.status {
            self.status = TaskStatus::Confirmed { tx_hash };
        }
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.status = TaskStatus::Failed {
            reason: reason.into(),
        };
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Confirmed { .. } | TaskStatus::Failed { .. }
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct PlanSummary {
    pub pending: usize,
    pub submitted: usize,
    pub confirmed: usize,
    pub failed: usize,
}

/// Ordered list of debt updates. Each task is an independent transaction:
/// the plan as a whole is not atomic and tasks may land in any order
/// relative to other vault activity.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct AllocationPlan {
    /// Equal share before capping
    pub per_strategy: U256,
    /// Left idle by truncating division
    pub remainder: U256,
    pub tasks: Vec<AllocationTask>,
    /// Strategies already at their target
    pub unchanged: Vec<Address>,
}

impl AllocationPlan {
    /// Split the vault's total assets evenly across `strategies`.
    ///
    /// Debt reductions are ordered before increases so the assets they free
    /// are idle by the time increases draw on them.
    pub fn equal(snapshot: &VaultSnapshot, strategies: &[StrategyAllocation]) -> Result<Self> {
        let count = NonZeroUsize::new(strategies.len()).ok_or(CoreError::NoStrategies)?;
        if snapshot.total_assets.is_zero() {
            return Err(CoreError::NoAssets);
        }

        let per_strategy = equal_split(snapshot.total_assets, count);
        let remainder = snapshot.total_assets - per_strategy * U256::from(count.get());

        let (mut tasks, unchanged): (Vec<_>, Vec<_>) = strategies
            .iter()
            .map(|s| AllocationTask::new(s, per_strategy))
            .partition(|task| task.change() != DebtChange::Unchanged);

        // Stable: queue order is kept within each group
        tasks.sort_by_key(|task| task.change() == DebtChange::Increase);

        Ok(Self {
            per_strategy,
            remainder,
            tasks,
            unchanged: unchanged.into_iter().map(|task| task.strategy).collect(),
        })
    }

    pub fn summary(&self) -> PlanSummary {
        self.tasks
            .iter()
            .fold(PlanSummary::default(), |mut summary, task| {
                match task.status {
                    TaskStatus::Pending => summary.pending += 1,
                    TaskStatus::Submitted { .. } => summary.submitted += 1,
                    TaskStatus::Confirmed { .. } => summary.confirmed += 1,
                    TaskStatus::Failed { .. } => summary.failed += 1,
                }
                summary
            })
    }

    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(AllocationTask::is_settled)
    }
}
