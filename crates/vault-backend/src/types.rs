//! Request and response types for the dashboard API
//!
//! Amounts are returned twice: `raw` in base units as a decimal string (to
//! survive JSON number precision) and `formatted` in human units.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use vault_core::{
    units::{format_bps, share_bps},
    AllocationBreakdown, AllocationPlan, AllocationTask, Capabilities, DebtChange, Headroom, Role,
    RoleMask, StrategyAllocation, UserPosition,
};

/// An on-chain amount in base and human units
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AmountView {
    pub raw: String,
    pub formatted: String,
}

impl AmountView {
    pub fn new(value: U256, decimals: u8) -> Self {
        Self {
            raw: value.to_string(),
            formatted: vault_core::format_amount(value, decimals),
        }
    }
}

/// One slice of the asset breakdown (pie chart)
#[derive(Debug, Serialize)]
pub struct SliceView {
    pub label: String,
    pub strategy: Option<Address>,
    pub amount: AmountView,
    /// Percentage of total assets, one decimal
    pub percent: String,
}

#[derive(Debug, Serialize)]
pub struct HeadroomView {
    /// `available` or `overdrawn`
    pub kind: &'static str,
    pub amount: AmountView,
}

impl HeadroomView {
    pub fn new(headroom: Headroom, decimals: u8) -> Self {
        let (kind, amount) = match headroom {
            Headroom::Available(amount) => ("available", amount),
            Headroom::Overdrawn(amount) => ("overdrawn", amount),
        };
        Self {
            kind,
            amount: AmountView::new(amount, decimals),
        }
    }
}

/// Response for GET /api/vault
#[derive(Debug, Serialize)]
pub struct VaultOverviewResponse {
    pub vault: Address,
    pub network: String,
    pub role_manager: Address,
    pub total_assets: AmountView,
    pub total_supply: AmountView,
    pub total_debt: AmountView,
    pub total_idle: AmountView,

    /// Formatted limit or `unlimited`
    pub deposit_limit: String,

    /// Remaining deposit capacity; absent when uncapped
    pub deposit_headroom: Option<AmountView>,

    pub strategy_count: usize,
    pub max_allocatable: HeadroomView,

    /// Idle assets that could be allocated right now
    pub can_allocate: AmountView,

    pub breakdown: Vec<SliceView>,
}

impl VaultOverviewResponse {
    pub fn breakdown_views(breakdown: &AllocationBreakdown, decimals: u8) -> Vec<SliceView> {
        breakdown
            .slices
            .iter()
            .map(|slice| SliceView {
                label: slice.label.clone(),
                strategy: slice.strategy,
                amount: AmountView::new(slice.amount, decimals),
                percent: format_bps(slice.bps),
            })
            .collect()
    }
}

/// Entry of GET /api/strategies
#[derive(Debug, Serialize)]
pub struct StrategyResponse {
    pub address: Address,
    pub current_debt: AmountView,
    pub max_debt: AmountView,
    pub activation: String,
    pub last_report: String,
    pub is_active: bool,

    /// Share of total assets, one decimal
    pub percent_of_assets: String,
}

impl StrategyResponse {
    pub fn new(strategy: &StrategyAllocation, total_assets: U256, decimals: u8) -> Self {
        Self {
            address: strategy.address,
            current_debt: AmountView::new(strategy.current_debt, decimals),
            max_debt: AmountView::new(strategy.max_debt, decimals),
            activation: strategy.activation.to_string(),
            last_report: strategy.last_report.to_string(),
            is_active: strategy.is_active(),
            percent_of_assets: format_bps(share_bps(strategy.current_debt, total_assets)),
        }
    }
}

/// Query for GET /api/positions/{address}
#[derive(Debug, Deserialize)]
pub struct PositionQuery {
    /// Prospective deposit/withdraw amount in human units
    pub amount: Option<String>,
}

/// What a prospective amount would allow
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AmountChecks {
    pub amount: AmountView,
    pub needs_approval: bool,
    pub can_deposit: bool,
    pub can_withdraw: bool,
}

/// Response for GET /api/positions/{address}
#[derive(Debug, Serialize)]
pub struct PositionResponse {
    pub account: Address,
    pub shares: AmountView,
    pub assets: AmountView,
    pub asset_balance: AmountView,
    pub allowance: AmountView,
    pub checks: Option<AmountChecks>,
}

impl PositionResponse {
    pub fn new(account: Address, position: &UserPosition, amount: Option<U256>, decimals: u8) -> Self {
        Self {
            account,
            shares: AmountView::new(position.shares, decimals),
            assets: AmountView::new(position.assets, decimals),
            asset_balance: AmountView::new(position.asset_balance, decimals),
            allowance: AmountView::new(position.allowance, decimals),
            checks: amount.map(|amount| AmountChecks {
                amount: AmountView::new(amount, decimals),
                needs_approval: position.needs_approval(amount),
                can_deposit: position.can_deposit(amount),
                can_withdraw: position.can_withdraw(amount),
            }),
        }
    }
}

/// A named role bit
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RoleEntry {
    pub value: u16,
    pub constant: &'static str,
    pub name: &'static str,
}

impl From<Role> for RoleEntry {
    fn from(role: Role) -> Self {
        Self {
            value: role.bit(),
            constant: role.constant_name(),
            name: role.display_name(),
        }
    }
}

/// Response for GET /api/roles/{address}
#[derive(Debug, Serialize)]
pub struct RoleReportResponse {
    pub account: Address,
    /// Decimal bitmask
    pub mask: String,
    pub active_roles: Vec<RoleEntry>,
    pub has_all_roles: bool,
    /// Bits set outside the defined role range, decimal
    pub unnamed_bits: String,
    /// Whether the admin panel should be shown at all
    pub has_admin_access: bool,
    pub capabilities: Capabilities,
}

impl RoleReportResponse {
    pub fn new(account: Address, mask: RoleMask) -> Self {
        let capabilities = Capabilities::from_mask(mask);
        Self {
            account,
            mask: mask.to_string(),
            active_roles: mask.active_roles().into_iter().map(RoleEntry::from).collect(),
            has_all_roles: mask.is_all_roles(),
            unnamed_bits: mask.unnamed_bits().to_string(),
            has_admin_access: capabilities.has_admin_access(),
            capabilities,
        }
    }
}

/// Request for POST /api/roles/compose
#[derive(Debug, Deserialize)]
pub struct ComposeRolesRequest {
    /// Role names, `ALL`, or raw decimal masks
    pub roles: Vec<String>,
}

/// Response for POST /api/roles/compose
#[derive(Debug, Serialize)]
pub struct ComposeRolesResponse {
    pub mask: String,
    pub active_roles: Vec<RoleEntry>,
    pub has_all_roles: bool,
}

/// One step of an allocation plan
#[derive(Debug, Serialize)]
pub struct TaskView {
    pub strategy: Address,
    pub current_debt: AmountView,
    pub target_debt: AmountView,
    pub change: DebtChange,
    pub capped: bool,
}

impl TaskView {
    pub fn new(task: &AllocationTask, decimals: u8) -> Self {
        Self {
            strategy: task.strategy,
            current_debt: AmountView::new(task.current_debt, decimals),
            target_debt: AmountView::new(task.target_debt, decimals),
            change: task.change(),
            capped: task.capped,
        }
    }
}

/// Response for GET /api/allocation/equal
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub per_strategy: AmountView,
    pub remainder: AmountView,
    pub tasks: Vec<TaskView>,
    pub unchanged: Vec<Address>,
}

impl PlanResponse {
    pub fn new(plan: &AllocationPlan, decimals: u8) -> Self {
        Self {
            per_strategy: AmountView::new(plan.per_strategy, decimals),
            remainder: AmountView::new(plan.remainder, decimals),
            tasks: plan.tasks.iter().map(|t| TaskView::new(t, decimals)).collect(),
            unchanged: plan.unchanged.clone(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Network the dashboard reads from
    pub network: String,
    pub timestamp: i64,
}
