//! Vault permission bitmask.
//!
//! The vault stores one `uint256` per account where each of the low 14 bits
//! grants one administrative permission. Bits above the defined range are
//! carried through untouched but never named.

use std::{
    fmt,
    ops::{BitAnd, BitOr, BitOrAssign},
    str::FromStr,
};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Value of the vault's `Roles.ALL` constant: every defined bit set.
pub const ALL_ROLES_BITS: u64 = 16_383;

/// A single named permission bit, in declaration order.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum Role {
    AddStrategyManager = 1,
    RevokeStrategyManager = 2,
    ForceRevokeManager = 4,
    AccountantManager = 8,
    QueueManager = 16,
    ReportingManager = 32,
    DebtManager = 64,
    MaxDebtManager = 128,
    DepositLimitManager = 256,
    WithdrawLimitManager = 512,
    MinimumIdleManager = 1024,
    ProfitUnlockManager = 2048,
    DebtPurchaser = 4096,
    EmergencyManager = 8192,
}

impl Role {
    /// Every role in ascending bit order.
    pub const ALL: [Role; 14] = [
        Role::AddStrategyManager,
        Role::RevokeStrategyManager,
        Role::ForceRevokeManager,
        Role::AccountantManager,
        Role::QueueManager,
        Role::ReportingManager,
        Role::DebtManager,
        Role::MaxDebtManager,
        Role::DepositLimitManager,
        Role::WithdrawLimitManager,
        Role::MinimumIdleManager,
        Role::ProfitUnlockManager,
        Role::DebtPurchaser,
        Role::EmergencyManager,
    ];

    pub const fn bit(self) -> u16 {
        self as u16
    }

    pub const fn mask(self) -> RoleMask {
        RoleMask(U256::from_limbs([self as u64, 0, 0, 0]))
    }

    /// Name of the constant in the vault's `Roles` library.
    pub const fn constant_name(self) -> &'static str {
        match self {
            Role::AddStrategyManager => "ADD_STRATEGY_MANAGER",
            Role::RevokeStrategyManager => "REVOKE_STRATEGY_MANAGER",
            Role::ForceRevokeManager => "FORCE_REVOKE_MANAGER",
            Role::AccountantManager => "ACCOUNTANT_MANAGER",
            Role::QueueManager => "QUEUE_MANAGER",
            Role::ReportingManager => "REPORTING_MANAGER",
            Role::DebtManager => "DEBT_MANAGER",
            Role::MaxDebtManager => "MAX_DEBT_MANAGER",
            Role::DepositLimitManager => "DEPOSIT_LIMIT_MANAGER",
            Role::WithdrawLimitManager => "WITHDRAW_LIMIT_MANAGER",
            Role::MinimumIdleManager => "MINIMUM_IDLE_MANAGER",
            Role::ProfitUnlockManager => "PROFIT_UNLOCK_MANAGER",
            Role::DebtPurchaser => "DEBT_PURCHASER",
            Role::EmergencyManager => "EMERGENCY_MANAGER",
        }
    }

    /// Human-readable label shown to operators.
    pub const fn display_name(self) -> &'static str {
        match self {
            Role::AddStrategyManager => "Add Strategy Manager",
            Role::RevokeStrategyManager => "Revoke Strategy Manager",
            Role::ForceRevokeManager => "Force Revoke Manager",
            Role::AccountantManager => "Accountant Manager",
            Role::QueueManager => "Queue Manager",
            Role::ReportingManager => "Reporting Manager",
            Role::DebtManager => "Debt Manager",
            Role::MaxDebtManager => "Max Debt Manager",
            Role::DepositLimitManager => "Deposit Limit Manager",
            Role::WithdrawLimitManager => "Withdraw Limit Manager",
            Role::MinimumIdleManager => "Minimum Idle Manager",
            Role::ProfitUnlockManager => "Profit Unlock Manager",
            Role::DebtPurchaser => "Debt Purchaser",
            Role::EmergencyManager => "Emergency Manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.constant_name())
    }
}

/// Accepts the constant name in any case, its kebab-case form, or the bit value.
impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(value) = trimmed.parse::<u16>() {
            return Role::ALL
                .into_iter()
                .find(|role| role.bit() == value)
                .ok_or_else(|| CoreError::UnknownRole(trimmed.to_string()));
        }

        let normalized = trimmed.replace('-', "_").to_ascii_uppercase();
        Role::ALL
            .into_iter()
            .find(|role| role.constant_name() == normalized)
            .ok_or_else(|| CoreError::UnknownRole(trimmed.to_string()))
    }
}

/// Permission bitmask of one account as read from `roles(account)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleMask(U256);

impl RoleMask {
    pub const EMPTY: RoleMask = RoleMask(U256::ZERO);
    pub const ALL: RoleMask = RoleMask(U256::from_limbs([ALL_ROLES_BITS, 0, 0, 0]));

    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> U256 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0.is_zero()
    }

    /// True iff any bit of `role` is set in this mask.
    pub fn has_role(self, role: impl Into<RoleMask>) -> bool {
        !(self.0 & role.into().0).is_zero()
    }

    /// True only for the exact `ALL` value; extra high bits disqualify.
    pub fn is_all_roles(self) -> bool {
        self == Self::ALL
    }

    /// Bitwise OR of every given value.
    pub fn union<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleMask>,
    {
        roles
            .into_iter()
            .fold(Self::EMPTY, |acc, role| acc | role.into())
    }

    pub fn add(self, other: RoleMask) -> Self {
        Self(self.0 | other.0)
    }

    pub fn remove(self, other: RoleMask) -> Self {
        Self(self.0 & !other.0)
    }

    /// Named roles present in the mask, in ascending bit order.
    pub fn active_roles(self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.has_role(*role))
            .collect()
    }

    pub fn active_role_names(self) -> Vec<&'static str> {
        self.active_roles()
            .into_iter()
            .map(Role::display_name)
            .collect()
    }

    /// Bits outside the defined role range.
    pub fn unnamed_bits(self) -> RoleMask {
        self.remove(Self::ALL)
    }
}

impl From<Role> for RoleMask {
    fn from(role: Role) -> Self {
        role.mask()
    }
}

impl From<u64> for RoleMask {
    fn from(raw: u64) -> Self {
        Self(U256::from(raw))
    }
}

impl From<U256> for RoleMask {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

impl BitOr for RoleMask {
    type Output = RoleMask;

    fn bitor(self, rhs: RoleMask) -> RoleMask {
        self.add(rhs)
    }
}

impl BitOrAssign for RoleMask {
    fn bitor_assign(&mut self, rhs: RoleMask) {
        *self = *self | rhs;
    }
}

impl BitAnd for RoleMask {
    type Output = RoleMask;

    fn bitand(self, rhs: RoleMask) -> RoleMask {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for RoleMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts `ALL`, a single role name, or a raw decimal mask.
impl FromStr for RoleMask {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::ALL);
        }
        if trimmed.chars().all(|c| c.is_ascii_digit()) && !trimmed.is_empty() {
            return U256::from_str_radix(trimmed, 10)
                .map(Self)
                .map_err(|_| CoreError::UnknownRole(trimmed.to_string()));
        }
        trimmed.parse::<Role>().map(Role::mask)
    }
}

/// A pending change to an account's roles, mirroring `set_role`, `add_role`
/// and `remove_role` on the vault.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoleUpdate {
    Set(RoleMask),
    Add(RoleMask),
    Remove(RoleMask),
}

impl RoleUpdate {
    /// Mask the account will hold once the update is mined.
    pub fn apply(self, current: RoleMask) -> RoleMask {
        match self {
            RoleUpdate::Set(mask) => mask,
            RoleUpdate::Add(mask) => current.add(mask),
            RoleUpdate::Remove(mask) => current.remove(mask),
        }
    }

    pub fn mask(self) -> RoleMask {
        match self {
            RoleUpdate::Set(mask) | RoleUpdate::Add(mask) | RoleUpdate::Remove(mask) => mask,
        }
    }
}

/// Which admin actions an account may take.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct Capabilities {
    pub is_admin: bool,
    pub can_add_strategy: bool,
    pub can_revoke_strategy: bool,
    pub can_manage_debt: bool,
    pub can_manage_max_debt: bool,
    pub can_manage_queue: bool,
    pub can_report: bool,
    pub can_set_deposit_limit: bool,
}

impl Capabilities {
    pub fn from_mask(mask: RoleMask) -> Self {
        let is_admin = mask.is_all_roles();
        let grants = |role: Role| is_admin || mask.has_role(role);

        Self {
            is_admin,
            can_add_strategy: grants(Role::AddStrategyManager),
            can_revoke_strategy: grants(Role::RevokeStrategyManager),
            can_manage_debt: grants(Role::DebtManager),
            can_manage_max_debt: grants(Role::MaxDebtManager),
            can_manage_queue: grants(Role::QueueManager),
            can_report: grants(Role::ReportingManager),
            can_set_deposit_limit: grants(Role::DepositLimitManager),
        }
    }

    /// Accounts without any of these are denied the admin surface entirely.
    pub fn has_admin_access(&self) -> bool {
        self.is_admin || self.can_add_strategy || self.can_manage_debt || self.can_manage_queue
    }
}
