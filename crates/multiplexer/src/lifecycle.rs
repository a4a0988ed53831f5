//! LifecycleManager - owns the single shared upstream connection
//!
//! ```text
//! Uninitialized --connect(u)--> Open(u)
//! Open(u) --connect(u), live--> Open(u)          (unchanged)
//! Open(u) --connect(u'), u' != u or closed--> Open(u')   (replaced)
//! Open(u) --close--> Closed
//! Closed --connect(u)--> Open(u)
//! ```

use std::sync::Arc;

use contracts::ConnectionId;
use tokio::sync::mpsc;
use tracing::{debug, info};
use upstream::{ReadyState, UpstreamConnector, UpstreamEvent, UpstreamHandle};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No connection was ever requested
    Uninitialized,
    /// A connection is held (its transport may still be connecting or failed)
    Open,
    /// The connection was closed on request
    Closed,
}

/// What a lifecycle operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First connection opened
    Opened(ConnectionId),
    /// Previous connection closed and a new one opened
    Replaced {
        previous: ConnectionId,
        current: ConnectionId,
    },
    /// Same endpoint and still live; nothing happened
    Unchanged(ConnectionId),
    /// Connection closed
    Closed(ConnectionId),
    /// Close with no connection held
    AlreadyClosed,
}

impl Transition {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Opened(_) => "opened",
            Self::Replaced { .. } => "replaced",
            Self::Unchanged(_) => "unchanged",
            Self::Closed(_) => "closed",
            Self::AlreadyClosed => "already_closed",
        }
    }
}

/// Holds at most one upstream connection at a time
pub struct LifecycleManager {
    connector: Arc<dyn UpstreamConnector>,
    events: mpsc::Sender<UpstreamEvent>,
    current: Option<UpstreamHandle>,
    state: LifecycleState,
    next_id: u64,
}

impl LifecycleManager {
    /// Create a manager opening connections through `connector`; every
    /// connection delivers its events to `events`
    pub fn new(connector: Arc<dyn UpstreamConnector>, events: mpsc::Sender<UpstreamEvent>) -> Self {
        Self {
            connector,
            events,
            current: None,
            state: LifecycleState::Uninitialized,
            next_id: 1,
        }
    }

    /// Ensure the live connection subscribes to `url`.
    ///
    /// Reopens when the url differs or the current connection is closed;
    /// otherwise leaves the connection alone.
    pub fn connect(&mut self, url: &str) -> Transition {
        let previous = match self.current.take() {
            Some(handle) if handle.url() == url && !handle.is_closed() => {
                let id = handle.id();
                self.current = Some(handle);
                debug!(connection = %id, url, "upstream unchanged");
                return Transition::Unchanged(id);
            }
            Some(mut handle) => {
                handle.close();
                Some(handle.id())
            }
            None => None,
        };

        let current = self.open(url);
        match previous {
            Some(previous) => {
                info!(%previous, %current, url, "upstream replaced");
                Transition::Replaced { previous, current }
            }
            None => {
                info!(connection = %current, url, "upstream opened");
                Transition::Opened(current)
            }
        }
    }

    /// Close and drop the connection, if any
    pub fn close(&mut self) -> Transition {
        match self.current.take() {
            Some(mut handle) => {
                handle.close();
                self.state = LifecycleState::Closed;
                info!(connection = %handle.id(), url = handle.url(), "upstream closed");
                Transition::Closed(handle.id())
            }
            None => Transition::AlreadyClosed,
        }
    }

    fn open(&mut self, url: &str) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.current = Some(self.connector.open(id, url, self.events.clone()));
        self.state = LifecycleState::Open;
        id
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Id of the held connection
    pub fn current_id(&self) -> Option<ConnectionId> {
        self.current.as_ref().map(UpstreamHandle::id)
    }

    /// Endpoint of the held connection
    pub fn current_url(&self) -> Option<&str> {
        self.current.as_ref().map(UpstreamHandle::url)
    }

    /// Ready state of the held connection
    pub fn ready_state(&self) -> Option<ReadyState> {
        self.current.as_ref().map(UpstreamHandle::ready_state)
    }

    /// Whether events tagged `id` come from the held connection
    pub fn is_current(&self, id: ConnectionId) -> bool {
        self.current_id() == Some(id)
    }
}
