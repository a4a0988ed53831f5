//! UpstreamConnector - seam between the multiplexer and its transport

use contracts::ConnectionId;
use tokio::sync::mpsc;

use crate::connection::UpstreamHandle;

/// One `message` event received on an upstream connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEvent {
    /// Connection the event arrived on
    pub connection_id: ConnectionId,
    /// Raw event data (one JSON telemetry batch)
    pub data: String,
}

/// Opens upstream connections.
///
/// `open` never blocks: it spawns whatever drives the connection and returns
/// immediately with a handle in the `Connecting` (or `Open`) state. Failures
/// are reported through the handle's ready state, never as an error.
/// Must be called from within a tokio runtime.
pub trait UpstreamConnector: Send + Sync {
    /// Open a subscription to `url`, delivering events to `events`
    fn open(
        &self,
        id: ConnectionId,
        url: &str,
        events: mpsc::Sender<UpstreamEvent>,
    ) -> UpstreamHandle;
}
