//! Crate-wide error and result types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OdooError>;

/// Everything that can go wrong between a tool call and the backend.
#[derive(Debug, Error)]
pub enum OdooError {
    /// Startup-time misconfiguration, e.g. a missing secret.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The login handshake did not produce a user id.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Fault reported by the Odoo server; the message is passed through.
    #[error("Odoo RPC error: {0}")]
    Rpc(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OdooError {
    /// JSON-RPC error code reported by the protocol layer.
    pub fn code(&self) -> i64 {
        match self {
            Self::Config(_) => -32001,
            Self::Auth(_) => -32003,
            Self::Serialization(_) => -32700,
            _ => -32000,
        }
    }
}
