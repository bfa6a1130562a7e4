//! Supported networks and the per-network deployment record written after
//! a vault is deployed and read back by every later command.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{MAINNET_CHAIN_ID, SEPOLIA_CHAIN_ID},
    error::{CoreError, Result},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Sepolia,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Mainnet, Network::Sepolia];

    pub const fn chain_id(self) -> u64 {
        match self {
            Network::Mainnet => MAINNET_CHAIN_ID,
            Network::Sepolia => SEPOLIA_CHAIN_ID,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Sepolia => "sepolia",
        }
    }

    /// Prefix of this network's environment variables, e.g. `SEPOLIA_RPC_URL`.
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Network::Mainnet => "MAINNET",
            Network::Sepolia => "SEPOLIA",
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Result<Self> {
        Network::ALL
            .into_iter()
            .find(|network| network.chain_id() == chain_id)
            .ok_or_else(|| CoreError::UnsupportedNetwork(format!("chainId {chain_id}")))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Network::ALL
            .into_iter()
            .find(|network| network.name() == normalized)
            .ok_or_else(|| CoreError::UnsupportedNetwork(s.trim().to_string()))
    }
}

/// Contents of `deployments/<network>.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub network: Network,
    pub chain_id: u64,
    pub vault: Address,
    /// Vault asset
    pub usdc: Address,
    /// Role manager passed to `initialize`
    pub admin: Address,
    pub deployed_at: DateTime<Utc>,
    pub deployer: Address,
}

impl DeploymentRecord {
    pub fn path_for(dir: &Path, network: Network) -> PathBuf {
        dir.join(format!("{}.json", network.name()))
    }

    /// Write the record as pretty JSON, creating `dir` if needed.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = Self::path_for(dir, self.network);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn load(dir: &Path, network: Network) -> Result<Self> {
        let path = Self::path_for(dir, network);
        if !path.exists() {
            return Err(CoreError::DeploymentNotFound(path));
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        std::env::temp_dir().join(format!("vault-core-{name}-{}-{nanos}", std::process::id()))
    }

    fn record() -> DeploymentRecord {
        DeploymentRecord {
            network: Network::Sepolia,
            chain_id: SEPOLIA_CHAIN_ID,
            vault: Address::repeat_byte(0x11),
            usdc: Address::repeat_byte(0x22),
            admin: Address::repeat_byte(0x33),
            deployed_at: Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap(),
            deployer: Address::repeat_byte(0x44),
        }
    }

    #[test]
    fn test_network_lookup() {
        assert_eq!(Network::from_chain_id(1).unwrap(), Network::Mainnet);
        assert_eq!(Network::from_chain_id(11_155_111).unwrap(), Network::Sepolia);
        assert!(matches!(
            Network::from_chain_id(137),
            Err(CoreError::UnsupportedNetwork(_))
        ));
        assert_eq!("Sepolia".parse::<Network>().unwrap(), Network::Sepolia);
        assert!("goerli".parse::<Network>().is_err());
    }

    #[test]
    fn test_record_json_field_names() {
        let json = serde_json::to_value(record()).unwrap();
        let object = json.as_object().unwrap();

        for key in ["network", "chainId", "vault", "usdc", "admin", "deployedAt", "deployer"] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(object.len(), 7);
        assert_eq!(json["network"], "sepolia");
        assert_eq!(json["chainId"], 11_155_111);
        assert_eq!(json["deployedAt"], "2025-01-15T12:00:00Z");
    }

    #[test]
    fn test_record_save_and_load() {
        let dir = scratch_dir("save");
        let path = record().save(&dir).unwrap();
        assert_eq!(path, dir.join("sepolia.json"));

        let loaded = DeploymentRecord::load(&dir, Network::Sepolia).unwrap();
        assert_eq!(loaded, record());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_record() {
        let dir = scratch_dir("missing");
        let err = DeploymentRecord::load(&dir, Network::Mainnet).unwrap_err();
        assert!(matches!(err, CoreError::DeploymentNotFound(_)));
        assert!(err.to_string().contains("mainnet.json"));
    }

    #[test]
    fn test_load_malformed_record() {
        let dir = scratch_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("sepolia.json"), "{\"network\": \"sepolia\"}").unwrap();

        let err = DeploymentRecord::load(&dir, Network::Sepolia).unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));

        fs::remove_dir_all(&dir).unwrap();
    }
}
