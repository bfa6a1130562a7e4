//! Runtime configuration, read once from the environment at startup and
//! passed down to routers and services.

use std::{path::PathBuf, time::Duration};

use alloy::{primitives::Address, transports::http::reqwest::Url};
use vault_core::{
    constants::{
        DEFAULT_MAX_DEPOSIT_LIMIT, DEFAULT_PROFIT_MAX_UNLOCK_TIME, DEFAULT_VAULT_NAME,
        DEFAULT_VAULT_SYMBOL,
    },
    DeploymentRecord, Network,
};

use crate::error::{BackendError, Result};

/// Endpoints and addresses for one supported network.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    pub rpc_url: Option<String>,
    pub usdc_address: Option<String>,
    pub vault_address: Option<String>,
}

/// Configuration for the dashboard server and the operator CLI
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,

    /// API keys for authentication
    pub api_keys: Vec<String>,

    /// Network served when none is given explicitly
    pub default_network: Network,

    pub mainnet: NetworkConfig,
    pub sepolia: NetworkConfig,

    /// Directory holding `<network>.json` deployment records
    pub deployments_dir: PathBuf,

    /// Compiled vault artifact with `bytecode`
    pub vault_artifact: PathBuf,

    /// Hex private key of the operator account
    pub private_key: Option<String>,

    /// Role manager and configure target; defaults to the operator
    pub admin_address: Option<String>,

    pub vault_name: String,
    pub vault_symbol: String,
    pub profit_max_unlock_time: u64,

    /// Deposit limit in human units, or `unlimited`
    pub max_deposit_limit: String,

    /// How long to wait for a transaction receipt
    pub receipt_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            cors_origins: vec!["http://localhost:3000".to_string()],
            api_keys: vec![],
            default_network: Network::Sepolia,
            mainnet: NetworkConfig::default(),
            sepolia: NetworkConfig::default(),
            deployments_dir: PathBuf::from("deployments"),
            vault_artifact: PathBuf::from("contracts/artifacts/Vault.json"),
            private_key: None,
            admin_address: None,
            vault_name: DEFAULT_VAULT_NAME.to_string(),
            vault_symbol: DEFAULT_VAULT_SYMBOL.to_string(),
            profit_max_unlock_time: DEFAULT_PROFIT_MAX_UNLOCK_TIME,
            max_deposit_limit: DEFAULT_MAX_DEPOSIT_LIMIT.to_string(),
            receipt_timeout: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; unset or blank keys take defaults.
    /// An unsupported `DEFAULT_NETWORK` is an error rather than a fallback.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let list = |key: &str| {
            get(key).map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
        };
        let network = |network: Network| {
            let prefix = network.env_prefix();
            NetworkConfig {
                rpc_url: get(&format!("{prefix}_RPC_URL")),
                usdc_address: get(&format!("{prefix}_USDC_ADDRESS")),
                vault_address: get(&format!("{prefix}_VAULT_ADDRESS")),
            }
        };

        let defaults = Self::default();

        let default_network = match get("DEFAULT_NETWORK") {
            Some(name) => name.parse::<Network>()?,
            None => defaults.default_network,
        };

        Ok(Self {
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: list("CORS_ORIGINS").unwrap_or(defaults.cors_origins),
            api_keys: list("API_KEYS").unwrap_or_default(),
            default_network,
            mainnet: network(Network::Mainnet),
            sepolia: network(Network::Sepolia),
            deployments_dir: get("DEPLOYMENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.deployments_dir),
            vault_artifact: get("VAULT_ARTIFACT")
                .map(PathBuf::from)
                .unwrap_or(defaults.vault_artifact),
            private_key: get("PRIVATE_KEY"),
            admin_address: get("ADMIN_ADDRESS"),
            vault_name: get("VAULT_NAME").unwrap_or(defaults.vault_name),
            vault_symbol: get("VAULT_SYMBOL").unwrap_or(defaults.vault_symbol),
            profit_max_unlock_time: get("PROFIT_MAX_UNLOCK_TIME")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.profit_max_unlock_time),
            max_deposit_limit: get("MAX_DEPOSIT_LIMIT").unwrap_or(defaults.max_deposit_limit),
            receipt_timeout: get("RECEIPT_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.receipt_timeout),
        })
    }

    pub fn network(&self, network: Network) -> &NetworkConfig {
        match network {
            Network::Mainnet => &self.mainnet,
            Network::Sepolia => &self.sepolia,
        }
    }

    pub fn rpc_url(&self, network: Network) -> Result<Url> {
        let key = format!("{}_RPC_URL", network.env_prefix());
        let raw = require(&self.network(network).rpc_url, &key)?;
        raw.parse()
            .map_err(|e| BackendError::Config(format!("{key} is not a valid URL: {e}")))
    }

    pub fn usdc_address(&self, network: Network) -> Result<Address> {
        let key = format!("{}_USDC_ADDRESS", network.env_prefix());
        parse_address(require(&self.network(network).usdc_address, &key)?, &key)
    }

    /// Vault address from the environment, else from the deployment record.
    pub fn vault_address(&self, network: Network) -> Result<Address> {
        let key = format!("{}_VAULT_ADDRESS", network.env_prefix());
        match &self.network(network).vault_address {
            Some(raw) => parse_address(raw, &key),
            None => Ok(DeploymentRecord::load(&self.deployments_dir, network)?.vault),
        }
    }

    pub fn private_key(&self) -> Result<&str> {
        require(&self.private_key, "PRIVATE_KEY")
    }

    /// Configured admin, falling back to `operator`.
    pub fn admin_or(&self, operator: Address) -> Result<Address> {
        match &self.admin_address {
            Some(raw) => parse_address(raw, "ADMIN_ADDRESS"),
            None => Ok(operator),
        }
    }
}

fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| BackendError::Config(format!("{key} not set")))
}

fn parse_address(raw: &str, key: &str) -> Result<Address> {
    raw.parse()
        .map_err(|e| BackendError::Config(format!("{key} is not a valid address: {e}")))
}
