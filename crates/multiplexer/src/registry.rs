//! PortRegistry - attached ports and broadcast fan-out

use std::collections::BTreeMap;
use std::sync::Arc;

use contracts::{PortId, TelemetryMessage};
use tracing::{debug, trace};

use crate::metrics::PortMetricsSnapshot;
use crate::port::{Delivery, PortHandle};

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Ports the message was queued for
    pub delivered: usize,
    /// Ports whose queue was full
    pub dropped: usize,
    /// Ports found closed and unregistered
    pub closed: Vec<PortId>,
}

/// Set of attached viewer ports, in attach order
#[derive(Debug, Default)]
pub struct PortRegistry {
    ports: BTreeMap<PortId, PortHandle>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a port. Returns false if a port with the same id is registered.
    pub fn register(&mut self, port: PortHandle) -> bool {
        if self.ports.contains_key(&port.id()) {
            return false;
        }
        debug!(port = %port.id(), "port registered");
        self.ports.insert(port.id(), port);
        true
    }

    /// Remove a port, dropping its sender so the viewer sees end-of-stream
    pub fn unregister(&mut self, id: PortId) -> Option<PortHandle> {
        let removed = self.ports.remove(&id);
        if removed.is_some() {
            debug!(port = %id, "port unregistered");
        }
        removed
    }

    pub fn contains(&self, id: PortId) -> bool {
        self.ports.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Registered port ids
    pub fn ids(&self) -> Vec<PortId> {
        self.ports.keys().copied().collect()
    }

    /// Metrics of every registered port
    pub fn metrics(&self) -> Vec<(PortId, PortMetricsSnapshot)> {
        self.ports
            .iter()
            .map(|(id, port)| (*id, port.metrics().snapshot()))
            .collect()
    }

    /// Remove every port
    pub fn clear(&mut self) {
        self.ports.clear();
    }

    /// Offer one shared message to every registered port.
    ///
    /// Never waits: a full queue drops the message for that port only, a
    /// closed port is unregistered. Other ports are unaffected either way.
    pub fn broadcast(&mut self, message: Arc<TelemetryMessage>) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for (id, port) in &self.ports {
            match port.try_deliver(&message) {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Dropped => report.dropped += 1,
                Delivery::Closed => report.closed.push(*id),
            }
        }

        for id in &report.closed {
            debug!(port = %id, "port closed, unregistering");
            self.ports.remove(id);
        }

        trace!(
            delivered = report.delivered,
            dropped = report.dropped,
            closed = report.closed.len(),
            "broadcast complete"
        );
        report
    }
}
