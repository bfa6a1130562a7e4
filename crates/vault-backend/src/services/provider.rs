//! RPC provider construction and transaction confirmation.

use std::time::Duration;

use alloy::{
    network::{Ethereum, EthereumWallet, ReceiptResponse},
    primitives::Address,
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::TransactionReceipt,
    signers::local::PrivateKeySigner,
};
use tracing::{debug, info};
use vault_core::Network;

use crate::{
    config::Config,
    error::{BackendError, Result},
};

/// Read-only provider for `network`.
pub fn read_provider(config: &Config, network: Network) -> Result<DynProvider> {
    let url = config.rpc_url(network)?;
    Ok(ProviderBuilder::new().connect_http(url).erased())
}

/// Provider that signs with `PRIVATE_KEY`, plus the signing account.
pub fn signer_provider(config: &Config, network: Network) -> Result<(DynProvider, Address)> {
    let url = config.rpc_url(network)?;
    let signer: PrivateKeySigner = config
        .private_key()?
        .parse()
        .map_err(|e| BackendError::Config(format!("PRIVATE_KEY is not a valid key: {e}")))?;
    let account = signer.address();

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url)
        .erased();

    Ok((provider, account))
}

/// Fail unless the endpoint's chain id is the one `network` expects.
pub async fn ensure_network(provider: &DynProvider, network: Network) -> Result<u64> {
    let chain_id = provider.get_chain_id().await?;
    let reported = Network::from_chain_id(chain_id)?;
    if reported != network {
        return Err(BackendError::Config(format!(
            "RPC endpoint for {network} reports {reported} (chainId: {chain_id})"
        )));
    }
    info!(%network, chain_id, "Connected");
    Ok(chain_id)
}

/// Wait for a sent transaction through alloy's pending-transaction watcher.
/// A reverted transaction is an error.
pub async fn confirm_pending(
    pending: PendingTransactionBuilder<Ethereum>,
    timeout: Duration,
) -> Result<TransactionReceipt> {
    let tx_hash = *pending.tx_hash();
    debug!(%tx_hash, timeout_secs = timeout.as_secs(), "Waiting for confirmation");

    let receipt = pending.with_timeout(Some(timeout)).get_receipt().await?;
    if !ReceiptResponse::status(&receipt) {
        return Err(BackendError::Transaction(format!("{tx_hash} reverted")));
    }
    Ok(receipt)
}
