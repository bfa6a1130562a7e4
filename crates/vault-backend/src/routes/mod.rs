//! API Routes

pub mod allocation;
pub mod health;
pub mod roles;
pub mod vault;

use std::sync::Arc;

use alloy::primitives::Address;

use crate::{
    config::Config,
    error::{BackendError, Result},
};

pub use allocation::allocation_router;
pub use health::health_router;
pub use roles::roles_router;
pub use vault::vault_router;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S> {
    pub config: Arc<Config>,
    pub source: S,
}

/// Parse an address from a path segment
pub(crate) fn parse_address(raw: &str) -> Result<Address> {
    raw.parse()
        .map_err(|_| BackendError::BadRequest(format!("Invalid address: {raw}")))
}
