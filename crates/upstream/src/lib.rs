//! # Upstream
//!
//! Transport for the telemetry server's push stream.
//!
//! Responsibilities:
//! - Open one server-sent-events subscription per [`UpstreamHandle`]
//! - Expose the connection's ready state to the owner of the handle
//! - Reconnect after network errors, give up on protocol errors
//! - Forward every `message` event tagged with its [`ConnectionId`]
//!
//! Payloads are forwarded as raw text; decoding is up to the consumer.
//!
//! ## Usage Example
//!
//! ```ignore
//! use upstream::{SseConnector, UpstreamConnector};
//!
//! let connector = SseConnector::from_config(&config.upstream)?;
//! let (tx, mut rx) = tokio::sync::mpsc::channel(256);
//! let handle = connector.open(ConnectionId(1), "https://localhost:8655/api/v1/events?stream=group1", tx);
//! while let Some(event) = rx.recv().await {
//!     // event.data is one JSON telemetry batch
//! }
//! ```
//!
//! [`ConnectionId`]: contracts::ConnectionId

mod connection;
mod connector;
mod error;
mod mock;
mod sse;
mod sse_connector;

pub use connection::{ConnectionState, ReadyState, UpstreamHandle};
pub use connector::{UpstreamConnector, UpstreamEvent};
pub use error::{Result, UpstreamError};
pub use mock::{MockConnector, MockConnectorConfig};
pub use sse::{SseDecoder, SseEvent};
pub use sse_connector::SseConnector;
