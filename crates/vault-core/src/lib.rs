//! Client-side logic for a multi-strategy ERC-4626 vault: role bitmask
//! interpretation, debt allocation planning, fixed-point amount handling and
//! the deployment record. Everything here is pure over values already read
//! from chain; the vault contract itself remains the source of truth.

pub mod allocation;
pub mod constants;
pub mod deployment;
pub mod error;
pub mod roles;
pub mod state;
pub mod units;

pub use allocation::{
    can_allocate, equal_split, max_allocatable, AllocationPlan, AllocationTask, DebtChange,
    Headroom, PlanSummary, TaskStatus,
};
pub use deployment::{DeploymentRecord, Network};
pub use error::{CoreError, Result};
pub use roles::{Capabilities, Role, RoleMask, RoleUpdate};
pub use state::{AllocationBreakdown, AllocationSlice, StrategyAllocation, UserPosition, VaultSnapshot};
pub use units::{format_amount, parse_amount, DepositLimit};
