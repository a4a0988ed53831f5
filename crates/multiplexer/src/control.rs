//! ControlHandler - viewer commands to lifecycle transitions
//!
//! The only code that drives the [`LifecycleManager`]. Commands are handled
//! one at a time in arrival order.

use std::collections::BTreeSet;

use contracts::{ClosePolicy, ControlCommand, PortId};
use serde_json::Value;
use tracing::debug;

use crate::lifecycle::{LifecycleManager, Transition};
use crate::selector::StreamSelector;

/// Applies control commands according to the close policy
pub struct ControlHandler {
    selector: StreamSelector,
    policy: ClosePolicy,
    lifecycle: LifecycleManager,
    /// Ports that issued CONNECT and have neither closed nor detached
    interested: BTreeSet<PortId>,
}

impl ControlHandler {
    pub fn new(selector: StreamSelector, policy: ClosePolicy, lifecycle: LifecycleManager) -> Self {
        Self {
            selector,
            policy,
            lifecycle,
            interested: BTreeSet::new(),
        }
    }

    /// Read access to the lifecycle manager
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn selector(&self) -> &StreamSelector {
        &self.selector
    }

    pub fn policy(&self) -> ClosePolicy {
        self.policy
    }

    /// Ports currently wanting the stream
    pub fn interested_ports(&self) -> usize {
        self.interested.len()
    }

    /// Handle a raw message from `port`.
    ///
    /// Returns `None` when the message is not a command or the command had no
    /// effect on the connection.
    pub fn handle(&mut self, port: PortId, raw: &Value) -> Option<Transition> {
        match ControlCommand::decode(raw) {
            Some(command) => self.apply(port, command),
            None => {
                debug!(%port, "ignoring unrecognised control message");
                observability::record_ignored_command();
                None
            }
        }
    }

    /// Apply a decoded command from `port`
    pub fn apply(&mut self, port: PortId, command: ControlCommand) -> Option<Transition> {
        match command {
            ControlCommand::Connect { group_id } => {
                self.interested.insert(port);
                let url = self.selector.endpoint_for(&group_id);
                debug!(%port, group = %group_id, %url, "connect requested");
                Some(self.lifecycle.connect(&url))
            }
            ControlCommand::Close => {
                debug!(%port, policy = ?self.policy, "close requested");
                match self.policy {
                    ClosePolicy::Global => {
                        self.interested.clear();
                        Some(self.lifecycle.close())
                    }
                    ClosePolicy::RefCounted => {
                        self.interested.remove(&port);
                        self.close_if_unwanted()
                    }
                }
            }
        }
    }

    /// Forget a port that detached or whose queue closed
    pub fn port_detached(&mut self, port: PortId) -> Option<Transition> {
        if !self.interested.remove(&port) {
            return None;
        }
        match self.policy {
            ClosePolicy::Global => None,
            ClosePolicy::RefCounted => self.close_if_unwanted(),
        }
    }

    /// Close the connection regardless of policy
    pub fn shutdown(&mut self) -> Transition {
        self.interested.clear();
        self.lifecycle.close()
    }

    fn close_if_unwanted(&mut self) -> Option<Transition> {
        if self.interested.is_empty() {
            Some(self.lifecycle.close())
        } else {
            debug!(
                remaining = self.interested.len(),
                "close deferred, stream still wanted"
            );
            None
        }
    }
}
