//! Viewer ports
//!
//! [`PortHandle`] is the service's sending side of one viewer's queue;
//! [`ViewerPort`] is what the viewer holds.

use std::sync::Arc;

use contracts::{ControlCommand, GroupId, PortId, TelemetryMessage};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::MultiplexerError;
use crate::metrics::{PortMetrics, PortMetricsSnapshot};
use crate::service::Request;

/// Outcome of offering one message to one port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the viewer
    Delivered,
    /// Queue full; dropped for this port only
    Dropped,
    /// Viewer is gone
    Closed,
}

/// Service-side handle on one viewer's bounded outbound queue
#[derive(Debug)]
pub struct PortHandle {
    id: PortId,
    tx: mpsc::Sender<Arc<TelemetryMessage>>,
    metrics: Arc<PortMetrics>,
}

impl PortHandle {
    /// Create a port queue of `capacity` messages.
    ///
    /// Returns the handle, the viewer's receiving end and the shared metrics.
    pub fn channel(
        id: PortId,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Arc<TelemetryMessage>>, Arc<PortMetrics>) {
        let (tx, rx) = mpsc::channel(capacity);
        let metrics = Arc::new(PortMetrics::new());
        let handle = Self {
            id,
            tx,
            metrics: Arc::clone(&metrics),
        };
        (handle, rx, metrics)
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn metrics(&self) -> &Arc<PortMetrics> {
        &self.metrics
    }

    /// Whether the viewer dropped its receiving end
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Offer a message without waiting
    pub fn try_deliver(&self, message: &Arc<TelemetryMessage>) -> Delivery {
        match self.tx.try_send(Arc::clone(message)) {
            Ok(()) => {
                self.metrics.inc_delivered_count();
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                Delivery::Delivered
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.inc_dropped_count();
                debug!(port = %self.id, "port queue full, message dropped");
                Delivery::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// A viewer's attachment to the multiplexer.
///
/// Sends control commands and receives normalized telemetry. Dropping the
/// port detaches it.
pub struct ViewerPort {
    id: PortId,
    requests: mpsc::Sender<Request>,
    rx: mpsc::Receiver<Arc<TelemetryMessage>>,
    metrics: Arc<PortMetrics>,
    detached: bool,
}

impl ViewerPort {
    pub(crate) fn new(
        id: PortId,
        requests: mpsc::Sender<Request>,
        rx: mpsc::Receiver<Arc<TelemetryMessage>>,
        metrics: Arc<PortMetrics>,
    ) -> Self {
        Self {
            id,
            requests,
            rx,
            metrics,
            detached: false,
        }
    }

    /// Port id
    pub fn id(&self) -> PortId {
        self.id
    }

    /// Post a raw control message. Unrecognised messages are ignored by the
    /// service.
    pub async fn post(&self, raw: Value) -> Result<(), MultiplexerError> {
        trace!(port = %self.id, "posting control message");
        self.requests
            .send(Request::Command { port: self.id, raw })
            .await
            .map_err(|_| MultiplexerError::ServiceStopped)
    }

    /// Post a typed control command
    pub async fn send(&self, command: ControlCommand) -> Result<(), MultiplexerError> {
        self.post(command.to_value()).await
    }

    /// Subscribe the shared stream to `group_id`
    pub async fn connect(&self, group_id: impl Into<GroupId>) -> Result<(), MultiplexerError> {
        self.send(ControlCommand::connect(group_id)).await
    }

    /// Ask for the shared stream to close
    pub async fn close_stream(&self) -> Result<(), MultiplexerError> {
        self.send(ControlCommand::Close).await
    }

    /// Next message; `None` once the service shut down or dropped this port
    pub async fn recv(&mut self) -> Option<Arc<TelemetryMessage>> {
        let message = self.rx.recv().await;
        self.metrics.set_queue_len(self.rx.len());
        message
    }

    /// Next message if one is already queued
    pub fn try_recv(&mut self) -> Option<Arc<TelemetryMessage>> {
        let message = self.rx.try_recv().ok();
        self.metrics.set_queue_len(self.rx.len());
        message
    }

    /// Delivery counters of this port
    pub fn metrics(&self) -> PortMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Detach from the service
    pub async fn detach(mut self) {
        self.detached = true;
        let _ = self.requests.send(Request::Detach { port: self.id }).await;
    }
}

impl Drop for ViewerPort {
    fn drop(&mut self) {
        if !self.detached {
            // Best effort; a closed queue is found on the next broadcast anyway
            let _ = self.requests.try_send(Request::Detach { port: self.id });
        }
    }
}

impl std::fmt::Debug for ViewerPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerPort").field("id", &self.id).finish()
    }
}
