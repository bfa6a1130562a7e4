//! Deploys the vault from compiled bytecode and initializes it.
//!
//! The vault has no constructor arguments; it is configured through a
//! separate `initialize` call right after deployment.

use std::{fs, path::Path, time::Duration};

use alloy::{
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider},
    rpc::types::TransactionRequest,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use vault_core::{DeploymentRecord, Network};

use crate::{
    config::Config,
    contracts::IVault,
    error::{BackendError, Result},
    services::provider::confirm_pending,
};

/// The part of the compiled vault artifact needed to deploy it.
#[derive(Debug, Deserialize)]
pub struct VaultArtifact {
    pub bytecode: Bytes,
}

impl VaultArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BackendError::Config(format!(
                "{} not found. Compile the vault first",
                path.display()
            )));
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| BackendError::Config(format!("{}: {e}", path.display())))?;
        let artifact: Self = serde_json::from_str(&contents)
            .map_err(|e| BackendError::Config(format!("{}: {e}", path.display())))?;

        if artifact.bytecode.is_empty() {
            return Err(BackendError::Config(format!(
                "{} has empty bytecode",
                path.display()
            )));
        }
        Ok(artifact)
    }
}

/// Arguments of `initialize(asset, name, symbol, role_manager, profit_max_unlock_time)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployParams {
    pub network: Network,
    pub asset: Address,
    pub role_manager: Address,
    pub name: String,
    pub symbol: String,
    pub profit_max_unlock_time: u64,
}

impl DeployParams {
    pub fn from_config(config: &Config, network: Network, deployer: Address) -> Result<Self> {
        Ok(Self {
            network,
            asset: config.usdc_address(network)?,
            role_manager: config.admin_or(deployer)?,
            name: config.vault_name.clone(),
            symbol: config.vault_symbol.clone(),
            profit_max_unlock_time: config.profit_max_unlock_time,
        })
    }
}

/// Deploy, initialize, and describe the new vault. The caller persists the record.
pub async fn deploy_vault(
    provider: &DynProvider,
    deployer: Address,
    artifact: &VaultArtifact,
    params: &DeployParams,
    receipt_timeout: Duration,
) -> Result<DeploymentRecord> {
    let chain_id = provider.get_chain_id().await?;

    info!(
        network = %params.network,
        chain_id,
        deployer = %deployer,
        bytecode_len = artifact.bytecode.len(),
        "Deploying vault"
    );

    let tx = TransactionRequest::default()
        .with_from(deployer)
        .with_deploy_code(artifact.bytecode.clone());
    let pending = provider.send_transaction(tx).await?;
    let deploy_hash = *pending.tx_hash();
    info!(tx = %deploy_hash, "Deployment transaction sent");

    let receipt = confirm_pending(pending, receipt_timeout).await?;
    let vault_address = ReceiptResponse::contract_address(&receipt).ok_or_else(|| {
        BackendError::Transaction(format!("{deploy_hash} created no contract"))
    })?;
    info!(vault = %vault_address, "Vault deployed");

    let vault = IVault::new(vault_address, provider.clone());
    let pending = vault
        .initialize(
            params.asset,
            params.name.clone(),
            params.symbol.clone(),
            params.role_manager,
            U256::from(params.profit_max_unlock_time),
        )
        .send()
        .await?;
    let init_hash = *pending.tx_hash();
    info!(tx = %init_hash, "Initialization transaction sent");

    confirm_pending(pending, receipt_timeout).await?;
    info!(
        asset = %params.asset,
        name = %params.name,
        symbol = %params.symbol,
        role_manager = %params.role_manager,
        profit_max_unlock_time = params.profit_max_unlock_time,
        "Vault initialized"
    );

    Ok(DeploymentRecord {
        network: params.network,
        chain_id,
        vault: vault_address,
        usdc: params.asset,
        admin: params.role_manager,
        deployed_at: Utc::now(),
        deployer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn scratch_file(name: &str, contents: &str) -> std::path::PathBuf {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let path = std::env::temp_dir().join(format!("vault-backend-{name}-{nanos}.json"));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_artifact_load() {
        let path = scratch_file("artifact", r#"{"abi": [], "bytecode": "0x6080604052"}"#);
        let artifact = VaultArtifact::load(&path).unwrap();
        assert_eq!(artifact.bytecode.as_ref(), &[0x60, 0x80, 0x60, 0x40, 0x52]);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_artifact_missing_or_empty() {
        let err = VaultArtifact::load(Path::new("/nonexistent/Vault.json")).unwrap_err();
        assert!(err.to_string().contains("Compile the vault first"));

        let path = scratch_file("empty", r#"{"bytecode": "0x"}"#);
        assert!(matches!(VaultArtifact::load(&path), Err(BackendError::Config(_))));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_params_from_config() {
        let usdc = "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238";
        let env: HashMap<&str, &str> = [("SEPOLIA_USDC_ADDRESS", usdc), ("VAULT_SYMBOL", "TST")]
            .into_iter()
            .collect();
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        let deployer = Address::repeat_byte(0x42);

        let params = DeployParams::from_config(&config, Network::Sepolia, deployer).unwrap();
        assert_eq!(params.asset, usdc.parse::<Address>().unwrap());
        assert_eq!(params.role_manager, deployer);
        assert_eq!(params.symbol, "TST");
        assert_eq!(params.name, "Tesseract Demo Vault");
        assert_eq!(params.profit_max_unlock_time, 604_800);
    }

    #[test]
    fn test_params_require_network_asset() {
        let config = Config::from_lookup(|_| None).unwrap();
        let err = DeployParams::from_config(&config, Network::Mainnet, Address::ZERO).unwrap_err();
        assert!(err.to_string().contains("MAINNET_USDC_ADDRESS not set"));
    }
}
