//! Error types for CLI operations.

use std::net::SocketAddr;

use contracts::ContractError;
use multiplexer::MultiplexerError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ContractError),

    /// The multiplexer could not be built or has stopped
    #[error("Multiplexer error: {0}")]
    Service(#[from] MultiplexerError),

    /// The viewer gateway could not bind its listener
    #[error("Failed to bind viewer gateway on {addr}: {source}")]
    GatewayBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn gateway_bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::GatewayBind { addr, source }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
