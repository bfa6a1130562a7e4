//! Read access to the vault.
//!
//! Every dashboard value is re-read from chain on each request; nothing is
//! cached between calls.

use std::future::Future;

use alloy::{
    primitives::{Address, U256},
    providers::DynProvider,
};
use futures::future::try_join_all;
use tracing::info;
use vault_core::{DepositLimit, RoleMask, StrategyAllocation, UserPosition, VaultSnapshot};

use crate::{
    contracts::{
        IERC20::{self, IERC20Instance},
        IVault::{self, IVaultInstance},
    },
    error::Result,
};

/// Source of vault state for the dashboard routes.
pub trait VaultSource: Clone + Send + Sync + 'static {
    fn vault_address(&self) -> Address;

    /// Decimals of the vault asset, used to scale every amount for display.
    fn asset_decimals(&self) -> u8;

    fn snapshot(&self) -> impl Future<Output = Result<VaultSnapshot>> + Send;

    /// Strategies of the default queue, in queue order.
    fn strategies(&self) -> impl Future<Output = Result<Vec<StrategyAllocation>>> + Send;

    fn roles_of(&self, account: Address) -> impl Future<Output = Result<RoleMask>> + Send;

    /// Account allowed to change every other account's roles.
    fn role_manager(&self) -> impl Future<Output = Result<Address>> + Send;

    fn position_of(&self, account: Address) -> impl Future<Output = Result<UserPosition>> + Send;
}

/// [`VaultSource`] backed by JSON-RPC calls.
#[derive(Clone)]
pub struct RpcVaultSource {
    vault: IVaultInstance<DynProvider>,
    asset: IERC20Instance<DynProvider>,
    decimals: u8,
}

impl RpcVaultSource {
    /// Bind to `vault`, discovering its asset and the asset's decimals.
    pub async fn connect(provider: DynProvider, vault: Address) -> Result<Self> {
        let vault = IVault::new(vault, provider.clone());
        let asset_address = vault.asset().call().await?;
        let asset = IERC20::new(asset_address, provider);
        let decimals = asset.decimals().call().await?;

        info!(
            vault = %vault.address(),
            asset = %asset_address,
            decimals,
            "Vault source connected"
        );

        Ok(Self {
            vault,
            asset,
            decimals,
        })
    }

    pub fn vault(&self) -> &IVaultInstance<DynProvider> {
        &self.vault
    }

    pub fn asset(&self) -> &IERC20Instance<DynProvider> {
        &self.asset
    }
}

impl VaultSource for RpcVaultSource {
    fn vault_address(&self) -> Address {
        *self.vault.address()
    }

    fn asset_decimals(&self) -> u8 {
        self.decimals
    }

    async fn snapshot(&self) -> Result<VaultSnapshot> {
        let vault = &self.vault;
        let (total_assets, total_supply, total_debt, total_idle, deposit_limit) = futures::try_join!(
            async { vault.totalAssets().call().await },
            async { vault.totalSupply().call().await },
            async { vault.totalDebt().call().await },
            async { vault.totalIdle().call().await },
            async { vault.deposit_limit().call().await },
        )?;

        Ok(VaultSnapshot {
            total_assets,
            total_supply,
            total_debt,
            total_idle,
            deposit_limit: DepositLimit::from_raw(deposit_limit),
        })
    }

    async fn strategies(&self) -> Result<Vec<StrategyAllocation>> {
        let vault = &self.vault;
        let queue = vault.get_default_queue().call().await?;

        let params = try_join_all(
            queue
                .iter()
                .map(|strategy| async move { vault.strategies(*strategy).call().await }),
        )
        .await?;

        Ok(queue
            .into_iter()
            .zip(params)
            .map(|(address, p)| StrategyAllocation {
                address,
                activation: p.activation,
                last_report: p.last_report,
                current_debt: p.current_debt,
                max_debt: p.max_debt,
            })
            .collect())
    }

    async fn roles_of(&self, account: Address) -> Result<RoleMask> {
        let raw = self.vault.roles(account).call().await?;
        Ok(RoleMask::from_raw(raw))
    }

    async fn role_manager(&self) -> Result<Address> {
        Ok(self.vault.role_manager().call().await?)
    }

    async fn position_of(&self, account: Address) -> Result<UserPosition> {
        let vault = &self.vault;
        let asset = &self.asset;
        let spender = *vault.address();

        let (shares, asset_balance, allowance) = futures::try_join!(
            async { vault.balanceOf(account).call().await },
            async { asset.balanceOf(account).call().await },
            async { asset.allowance(account, spender).call().await },
        )?;

        let assets = if shares.is_zero() {
            U256::ZERO
        } else {
            vault.convertToAssets(shares).call().await?
        };

        Ok(UserPosition {
            shares,
            assets,
            asset_balance,
            allowance,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    //! In-memory vault used by route and service tests.

    use super::*;
    use crate::error::BackendError;
    use std::{collections::HashMap, sync::Arc};

    #[derive(Clone, Default)]
    pub struct StaticVault {
        pub address: Address,
        pub role_manager: Address,
        pub snapshot: VaultSnapshot,
        pub strategies: Vec<StrategyAllocation>,
        pub roles: Arc<HashMap<Address, RoleMask>>,
        pub positions: Arc<HashMap<Address, UserPosition>>,
        /// Make every read fail with this RPC error
        pub failure: Option<String>,
    }

    impl StaticVault {
        fn check(&self) -> Result<()> {
            match &self.failure {
                Some(reason) => Err(BackendError::Rpc(reason.clone())),
                None => Ok(()),
            }
        }
    }

    impl VaultSource for StaticVault {
        fn vault_address(&self) -> Address {
            self.address
        }

        fn asset_decimals(&self) -> u8 {
            6
        }

        async fn snapshot(&self) -> Result<VaultSnapshot> {
            self.check()?;
            Ok(self.snapshot)
        }

        async fn strategies(&self) -> Result<Vec<StrategyAllocation>> {
            self.check()?;
            Ok(self.strategies.clone())
        }

        async fn roles_of(&self, account: Address) -> Result<RoleMask> {
            self.check()?;
            Ok(self.roles.get(&account).copied().unwrap_or_default())
        }

        async fn role_manager(&self) -> Result<Address> {
            self.check()?;
            Ok(self.role_manager)
        }

        async fn position_of(&self, account: Address) -> Result<UserPosition> {
            self.check()?;
            Ok(self.positions.get(&account).copied().unwrap_or_default())
        }
    }
}
