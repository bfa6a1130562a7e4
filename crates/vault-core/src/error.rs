use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount {amount} has more than {decimals} fractional digits")]
    TooManyDecimals { amount: String, decimals: u8 },

    #[error("Amount does not fit in 256 bits: {0}")]
    AmountOverflow(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Vault has no strategies to allocate to")]
    NoStrategies,

    #[error("Vault holds no assets to allocate")]
    NoAssets,

    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Deployment file not found: {}. Run the deploy command first", .0.display())]
    DeploymentNotFound(PathBuf),

    #[error("Deployment record I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deployment record is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
