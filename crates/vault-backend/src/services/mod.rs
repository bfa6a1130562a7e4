//! Chain-facing services

pub mod configurator;
pub mod deployer;
pub mod operator;
pub mod provider;
pub mod rebalance;
pub mod vault_source;

pub use operator::VaultOperator;
pub use vault_source::{RpcVaultSource, VaultSource};
