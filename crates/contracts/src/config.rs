//! MuxConfig - Config Loader output
//!
//! Describes the upstream origin, per-port buffering, connection ownership
//! policy and the viewer gateway listener.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use validator::Validate;

/// Default development origin of the telemetry server
pub const DEFAULT_DEV_ORIGIN: &str = "https://localhost:8655";

/// Complete multiplexer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MuxConfig {
    /// Upstream telemetry server
    #[serde(default)]
    #[validate(nested)]
    pub upstream: UpstreamConfig,

    /// Viewer port buffering
    #[serde(default)]
    #[validate(nested)]
    pub ports: PortConfig,

    /// Upstream connection ownership
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Viewer gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Runtime mode selecting the upstream base origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    /// Same-origin relative endpoints
    Production,
    /// Explicit development origin
    #[default]
    Development,
}

impl RuntimeMode {
    /// Parse a mode flag (case-insensitive)
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Upstream telemetry server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpstreamConfig {
    /// Runtime mode
    #[serde(default)]
    pub mode: RuntimeMode,

    /// Origin used in development mode
    #[serde(default = "default_dev_origin")]
    #[validate(url)]
    pub dev_origin: String,

    /// Same-origin base that relative (production) endpoints resolve against
    #[serde(default)]
    #[validate(url)]
    pub origin: Option<String>,

    /// Accept self-signed certificates
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Reconnection delay in milliseconds until the server sends `retry:`
    #[serde(default = "default_retry_ms")]
    #[validate(range(min = 1))]
    pub retry_ms: u64,

    /// Capacity of the upstream event channel
    #[serde(default = "default_event_capacity")]
    #[validate(range(min = 1))]
    pub event_capacity: usize,
}

fn default_dev_origin() -> String {
    DEFAULT_DEV_ORIGIN.to_string()
}

fn default_retry_ms() -> u64 {
    3000
}

fn default_event_capacity() -> usize {
    256
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            mode: RuntimeMode::default(),
            dev_origin: default_dev_origin(),
            origin: None,
            accept_invalid_certs: false,
            retry_ms: default_retry_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl UpstreamConfig {
    /// Base prepended to endpoint paths: empty in production, the
    /// development origin (without trailing slash) otherwise
    pub fn base(&self) -> &str {
        match self.mode {
            RuntimeMode::Production => "",
            RuntimeMode::Development => self.dev_origin.trim_end_matches('/'),
        }
    }
}

/// Viewer port configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PortConfig {
    /// Outbound queue capacity per port; deliveries beyond it are dropped
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Who may tear the shared upstream connection down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosePolicy {
    /// Any CLOSE closes the connection for every viewer
    #[default]
    Global,
    /// The connection stays open while at least one viewer still wants it
    RefCounted,
}

/// Upstream connection ownership configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// CLOSE semantics
    #[serde(default)]
    pub close_policy: ClosePolicy,
}

/// TCP viewer gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8700))
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}
