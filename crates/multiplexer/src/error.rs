//! Multiplexer error types

use thiserror::Error;

/// Multiplexer errors
#[derive(Debug, Error)]
pub enum MultiplexerError {
    /// The service task has stopped
    #[error("multiplexer service is not running")]
    ServiceStopped,

    /// Upstream transport could not be set up
    #[error("upstream setup failed: {0}")]
    Upstream(#[from] upstream::UpstreamError),

    /// Contract error (config, payload)
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),
}
