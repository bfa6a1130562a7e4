/// Decimals of the vault asset (USDC) and of the vault shares.
pub const ASSET_DECIMALS: u8 = 6;

pub const MAINNET_CHAIN_ID: u64 = 1;
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

pub const DEFAULT_VAULT_NAME: &str = "Tesseract Demo Vault";
pub const DEFAULT_VAULT_SYMBOL: &str = "YINDX";

/// One week, in seconds.
pub const DEFAULT_PROFIT_MAX_UNLOCK_TIME: u64 = 604_800;

/// Human units of the asset.
pub const DEFAULT_MAX_DEPOSIT_LIMIT: &str = "10000000";

pub const BPS_DENOMINATOR: u64 = 10_000;

pub const UNALLOCATED_LABEL: &str = "Unallocated";
