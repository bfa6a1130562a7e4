use alloy_primitives::{Address, U256};
use serde::Serialize;

use crate::{
    constants::UNALLOCATED_LABEL,
    units::{share_bps, DepositLimit},
};

/// Vault-wide totals as read from the vault in one refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VaultSnapshot {
    pub total_assets: U256,
    pub total_supply: U256,
    /// Assets lent out to strategies
    pub total_debt: U256,
    /// Assets held by the vault itself
    pub total_idle: U256,
    pub deposit_limit: DepositLimit,
}

impl VaultSnapshot {
    /// How much more can be deposited before the cap is hit; `None` if uncapped.
    pub fn deposit_headroom(&self) -> Option<U256> {
        self.deposit_limit.remaining(self.total_assets)
    }
}

/// One entry of the vault's `strategies(address)` mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrategyAllocation {
    pub address: Address,
    pub activation: U256,
    pub last_report: U256,
    pub current_debt: U256,
    pub max_debt: U256,
}

impl StrategyAllocation {
    pub fn is_active(&self) -> bool {
        !self.current_debt.is_zero() || !self.max_debt.is_zero()
    }

    /// Debt that can still be added before hitting `max_debt`.
    pub fn room(&self) -> U256 {
        self.max_debt.saturating_sub(self.current_debt)
    }
}

/// A depositor's holdings and token permissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserPosition {
    /// Vault shares held
    pub shares: U256,
    /// `convertToAssets(shares)`
    pub assets: U256,
    /// Asset tokens in the wallet
    pub asset_balance: U256,
    /// Asset allowance granted to the vault
    pub allowance: U256,
}

impl UserPosition {
    pub fn needs_approval(&self, amount: U256) -> bool {
        !amount.is_zero() && amount > self.allowance
    }

    pub fn can_deposit(&self, amount: U256) -> bool {
        !amount.is_zero() && amount <= self.allowance && amount <= self.asset_balance
    }

    pub fn can_withdraw(&self, amount: U256) -> bool {
        !amount.is_zero() && amount <= self.assets
    }
}

/// One slice of the vault's assets, either a strategy's debt or the idle remainder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AllocationSlice {
    pub label: String,
    pub strategy: Option<Address>,
    pub amount: U256,
    pub bps: u32,
}

/// Where the vault's assets currently sit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AllocationBreakdown {
    pub slices: Vec<AllocationSlice>,
    pub unallocated: U256,
}

impl AllocationBreakdown {
    /// Strategies with zero debt are omitted. Empty when the vault holds nothing.
    pub fn compute(total_assets: U256, strategies: &[StrategyAllocation]) -> Self {
        if total_assets.is_zero() {
            return Self::default();
        }

        let allocated = strategies
            .iter()
            .fold(U256::ZERO, |acc, s| acc.saturating_add(s.current_debt));
        let unallocated = total_assets.saturating_sub(allocated);

        let mut slices: Vec<AllocationSlice> = strategies
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.current_debt.is_zero())
            .map(|(index, s)| AllocationSlice {
                label: format!("Strategy {}", index + 1),
                strategy: Some(s.address),
                amount: s.current_debt,
                bps: share_bps(s.current_debt, total_assets),
            })
            .collect();

        if !unallocated.is_zero() {
            slices.push(AllocationSlice {
                label: UNALLOCATED_LABEL.to_string(),
                strategy: None,
                amount: unallocated,
                bps: share_bps(unallocated, total_assets),
            });
        }

        Self {
            slices,
            unallocated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(byte: u8, current_debt: u64, max_debt: u64) -> StrategyAllocation {
        StrategyAllocation {
            address: Address::repeat_byte(byte),
            current_debt: U256::from(current_debt),
            max_debt: U256::from(max_debt),
            ..Default::default()
        }
    }

    #[test]
    fn test_strategy_is_active() {
        assert!(!strategy(1, 0, 0).is_active());
        assert!(strategy(1, 0, 10).is_active());
        assert!(strategy(1, 5, 0).is_active());
    }

    #[test]
    fn test_strategy_room_saturates() {
        assert_eq!(strategy(1, 30, 100).room(), U256::from(70u64));
        assert_eq!(strategy(1, 150, 100).room(), U256::ZERO);
    }

    #[test]
    fn test_user_position_flags() {
        let position = UserPosition {
            shares: U256::from(900u64),
            assets: U256::from(1_000u64),
            asset_balance: U256::from(500u64),
            allowance: U256::from(200u64),
        };

        assert!(position.needs_approval(U256::from(300u64)));
        assert!(!position.needs_approval(U256::from(200u64)));
        assert!(!position.needs_approval(U256::ZERO));

        assert!(position.can_deposit(U256::from(200u64)));
        assert!(!position.can_deposit(U256::from(201u64)));
        assert!(!position.can_deposit(U256::ZERO));

        assert!(position.can_withdraw(U256::from(1_000u64)));
        assert!(!position.can_withdraw(U256::from(1_001u64)));
    }

    #[test]
    fn test_breakdown_empty_vault() {
        let breakdown = AllocationBreakdown::compute(U256::ZERO, &[strategy(1, 0, 100)]);
        assert!(breakdown.slices.is_empty());
        assert_eq!(breakdown.unallocated, U256::ZERO);
    }

    #[test]
    fn test_breakdown_slices_and_idle() {
        let strategies = [strategy(1, 250, 500), strategy(2, 0, 500), strategy(3, 500, 500)];
        let breakdown = AllocationBreakdown::compute(U256::from(1_000u64), &strategies);

        assert_eq!(breakdown.slices.len(), 3);
        assert_eq!(breakdown.slices[0].label, "Strategy 1");
        assert_eq!(breakdown.slices[0].bps, 2_500);
        assert_eq!(breakdown.slices[1].label, "Strategy 3");
        assert_eq!(breakdown.slices[1].bps, 5_000);
        assert_eq!(breakdown.slices[2].label, UNALLOCATED_LABEL);
        assert_eq!(breakdown.slices[2].strategy, None);
        assert_eq!(breakdown.unallocated, U256::from(250u64));
    }

    #[test]
    fn test_breakdown_fully_allocated_has_no_idle_slice() {
        let strategies = [strategy(1, 600, 600), strategy(2, 400, 600)];
        let breakdown = AllocationBreakdown::compute(U256::from(1_000u64), &strategies);

        assert_eq!(breakdown.slices.len(), 2);
        assert!(breakdown.slices.iter().all(|s| s.strategy.is_some()));
        let total_bps: u32 = breakdown.slices.iter().map(|s| s.bps).sum();
        assert_eq!(total_bps, 10_000);
    }

    #[test]
    fn test_deposit_headroom() {
        let snapshot = VaultSnapshot {
            total_assets: U256::from(700u64),
            deposit_limit: DepositLimit::Limited(U256::from(1_000u64)),
            ..Default::default()
        };
        assert_eq!(snapshot.deposit_headroom(), Some(U256::from(300u64)));

        let uncapped = VaultSnapshot {
            deposit_limit: DepositLimit::Unlimited,
            ..snapshot
        };
        assert_eq!(uncapped.deposit_headroom(), None);
    }
}
