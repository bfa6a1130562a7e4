//! Error types for the vault backend

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use vault_core::CoreError;

/// Backend error types
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chain call failed: {0}")]
    Rpc(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            BackendError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            BackendError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "CONFIG_ERROR"),
            BackendError::Rpc(_) => (StatusCode::BAD_GATEWAY, "RPC_ERROR"),
            BackendError::Transaction(_) => (StatusCode::BAD_GATEWAY, "TRANSACTION_FAILED"),
            BackendError::Unauthorized(_) => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            BackendError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<CoreError> for BackendError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeploymentNotFound(_)
            | CoreError::UnsupportedNetwork(_)
            | CoreError::Io(_)
            | CoreError::Json(_) => BackendError::Config(err.to_string()),
            _ => BackendError::BadRequest(err.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for BackendError {
    fn from(err: alloy::contract::Error) -> Self {
        BackendError::Rpc(err.to_string())
    }
}

impl From<alloy::transports::TransportError> for BackendError {
    fn from(err: alloy::transports::TransportError) -> Self {
        BackendError::Rpc(err.to_string())
    }
}

impl From<alloy::providers::PendingTransactionError> for BackendError {
    fn from(err: alloy::providers::PendingTransactionError) -> Self {
        BackendError::Transaction(err.to_string())
    }
}

impl From<anyhow::Error> for BackendError {
    fn from(err: anyhow::Error) -> Self {
        BackendError::Internal(err.to_string())
    }
}

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;
