//! Signed writes to the vault and its asset.
//!
//! Every write waits for its receipt and returns the transaction hash.
//! Nothing is retried; a failure is returned to the caller as-is.

use std::time::Duration;

use alloy::{
    network::Ethereum,
    primitives::{Address, B256, U256},
    providers::{DynProvider, PendingTransactionBuilder},
};
use tracing::info;
use vault_core::{Capabilities, DepositLimit, RoleMask, RoleUpdate};

use crate::{
    error::{BackendError, Result},
    services::{
        provider::confirm_pending,
        rebalance::DebtUpdater,
        vault_source::{RpcVaultSource, VaultSource},
    },
};

pub struct VaultOperator {
    source: RpcVaultSource,
    account: Address,
    receipt_timeout: Duration,
}

impl VaultOperator {
    /// `provider` must sign for `account`.
    pub async fn connect(
        provider: DynProvider,
        account: Address,
        vault: Address,
        receipt_timeout: Duration,
    ) -> Result<Self> {
        let source = RpcVaultSource::connect(provider, vault).await?;
        Ok(Self {
            source,
            account,
            receipt_timeout,
        })
    }

    pub fn source(&self) -> &RpcVaultSource {
        &self.source
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn decimals(&self) -> u8 {
        self.source.asset_decimals()
    }

    pub async fn capabilities(&self) -> Result<Capabilities> {
        let mask = self.source.roles_of(self.account).await?;
        Ok(Capabilities::from_mask(mask))
    }

    /// Fail early when the operator lacks the role an action needs.
    pub async fn require(&self, allowed: fn(&Capabilities) -> bool, action: &str) -> Result<()> {
        let capabilities = self.capabilities().await?;
        ensure_allowed(self.account, &capabilities, allowed, action)
    }

    async fn confirm_tx(
        &self,
        action: &str,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<B256> {
        let tx_hash = *pending.tx_hash();
        info!(action, tx = %tx_hash, "Transaction sent, waiting for confirmation");
        confirm_pending(pending, self.receipt_timeout).await?;
        info!(action, tx = %tx_hash, "Transaction confirmed");
        Ok(tx_hash)
    }

    pub async fn add_strategy(&self, strategy: Address) -> Result<B256> {
        let pending = self.source.vault().add_strategy(strategy).send().await?;
        self.confirm_tx("add_strategy", pending).await
    }

    pub async fn update_debt(&self, strategy: Address, target_debt: U256) -> Result<B256> {
        let pending = self.send_update_debt(strategy, target_debt).await?;
        self.confirm_tx("update_debt", pending).await
    }

    pub async fn set_max_debt(&self, strategy: Address, max_debt: U256) -> Result<B256> {
        let pending = self
            .source
            .vault()
            .update_max_debt_for_strategy(strategy, max_debt)
            .send()
            .await?;
        self.confirm_tx("update_max_debt_for_strategy", pending)
            .await
    }

    pub async fn process_report(&self, strategy: Address) -> Result<B256> {
        let pending = self.source.vault().process_report(strategy).send().await?;
        self.confirm_tx("process_report", pending).await
    }

    pub async fn set_deposit_limit(&self, limit: DepositLimit) -> Result<B256> {
        let pending = self
            .source
            .vault()
            .set_deposit_limit(limit.to_raw())
            .send()
            .await?;
        self.confirm_tx("set_deposit_limit", pending).await
    }

    /// Submit a role change and return the mask the account will hold.
    pub async fn update_roles(&self, account: Address, update: RoleUpdate) -> Result<(B256, RoleMask)> {
        let current = self.source.roles_of(account).await?;
        let vault = self.source.vault();
        let raw = update.mask().raw();

        let (action, pending) = match update {
            RoleUpdate::Set(_) => ("set_role", vault.set_role(account, raw).send().await?),
            RoleUpdate::Add(_) => ("add_role", vault.add_role(account, raw).send().await?),
            RoleUpdate::Remove(_) => ("remove_role", vault.remove_role(account, raw).send().await?),
        };

        let tx_hash = self.confirm_tx(action, pending).await?;
        Ok((tx_hash, update.apply(current)))
    }

    pub async fn approve(&self, amount: U256) -> Result<B256> {
        let spender = self.source.vault_address();
        let pending = self.source.asset().approve(spender, amount).send().await?;
        self.confirm_tx("approve", pending).await
    }

    /// Deposit `assets` for the operator itself.
    pub async fn deposit(&self, assets: U256) -> Result<B256> {
        let pending = self
            .source
            .vault()
            .deposit(assets, self.account)
            .send()
            .await?;
        self.confirm_tx("deposit", pending).await
    }

    pub async fn withdraw(&self, assets: U256) -> Result<B256> {
        let pending = self
            .source
            .vault()
            .withdraw(assets, self.account, self.account)
            .send()
            .await?;
        self.confirm_tx("withdraw", pending).await
    }

    pub async fn redeem(&self, shares: U256) -> Result<B256> {
        let pending = self
            .source
            .vault()
            .redeem(shares, self.account, self.account)
            .send()
            .await?;
        self.confirm_tx("redeem", pending).await
    }
}

impl DebtUpdater for VaultOperator {
    type Pending = PendingTransactionBuilder<Ethereum>;

    async fn send_update_debt(&self, strategy: Address, target_debt: U256) -> Result<Self::Pending> {
        Ok(self
            .source
            .vault()
            .update_debt(strategy, target_debt)
            .send()
            .await?)
    }

    fn tx_hash(pending: &Self::Pending) -> B256 {
        *pending.tx_hash()
    }

    async fn confirm(&self, pending: Self::Pending) -> Result<()> {
        self.confirm_tx("update_debt", pending).await.map(|_| ())
    }
}

/// `Unauthorized` unless `capabilities` allow the action.
fn ensure_allowed(
    account: Address,
    capabilities: &Capabilities,
    allowed: fn(&Capabilities) -> bool,
    action: &str,
) -> Result<()> {
    if allowed(capabilities) {
        Ok(())
    } else {
        Err(BackendError::Unauthorized(format!(
            "{account} lacks the role required to {action}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_core::{Role, RoleMask};

    #[test]
    fn test_debt_manager_may_update_debt() {
        let caps = Capabilities::from_mask(Role::DebtManager.mask());
        assert!(ensure_allowed(Address::ZERO, &caps, |c| c.can_manage_debt, "update debt").is_ok());
    }

    #[test]
    fn test_missing_role_is_unauthorized() {
        let account = Address::repeat_byte(0x42);
        let caps = Capabilities::from_mask(Role::ReportingManager.mask());

        let err = ensure_allowed(account, &caps, |c| c.can_add_strategy, "add strategies")
            .unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized(_)));
        assert!(err.to_string().contains("add strategies"));
        assert!(err.to_string().contains(&account.to_string()));
    }

    #[test]
    fn test_admin_may_do_everything() {
        let caps = Capabilities::from_mask(RoleMask::ALL);
        let checks: [fn(&Capabilities) -> bool; 4] = [
            |c| c.can_add_strategy,
            |c| c.can_manage_debt,
            |c| c.can_set_deposit_limit,
            |c| c.can_report,
        ];
        for check in checks {
            assert!(ensure_allowed(Address::ZERO, &caps, check, "act").is_ok());
        }
    }
}
