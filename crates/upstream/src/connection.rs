//! Upstream connection handle and its observable ready state

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use contracts::ConnectionId;
use tokio::task::JoinHandle;
use tracing::debug;

/// Ready state of an upstream connection, mirroring a browser `EventSource`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// Connecting or waiting to reconnect
    Connecting,
    /// Response received, events flowing
    Open,
    /// Closed by the owner or failed permanently; never reopens
    Closed,
}

impl ReadyState {
    fn as_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closed => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Connecting,
            1 => Self::Open,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// State shared between a handle and the task driving its connection
#[derive(Debug)]
pub struct ConnectionState {
    ready: AtomicU8,
    close_requested: AtomicBool,
}

impl ConnectionState {
    /// Create shared state starting in `initial`
    pub fn new(initial: ReadyState) -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicU8::new(initial.as_u8()),
            close_requested: AtomicBool::new(false),
        })
    }

    /// Current ready state
    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from_u8(self.ready.load(Ordering::Acquire))
    }

    /// Move to `state` unless already closed. Returns false if the
    /// connection was closed.
    pub fn set(&self, state: ReadyState) -> bool {
        let next = state.as_u8();
        self.ready
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur != ReadyState::Closed.as_u8()).then_some(next)
            })
            .is_ok()
    }

    /// Whether the owner asked for the connection to close
    pub fn close_requested(&self) -> bool {
        self.close_requested.load(Ordering::Acquire)
    }

    fn request_close(&self) {
        self.close_requested.store(true, Ordering::Release);
        self.ready.store(ReadyState::Closed.as_u8(), Ordering::Release);
    }
}

/// Owner's handle on one upstream connection.
///
/// Closing is idempotent; dropping the handle closes the connection.
pub struct UpstreamHandle {
    id: ConnectionId,
    url: String,
    state: Arc<ConnectionState>,
    task: Option<JoinHandle<()>>,
}

impl UpstreamHandle {
    /// Create a handle over shared state
    pub fn new(id: ConnectionId, url: impl Into<String>, state: Arc<ConnectionState>) -> Self {
        Self {
            id,
            url: url.into(),
            state,
            task: None,
        }
    }

    /// Attach the task driving the connection; it is aborted on close
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.task = Some(task);
        self
    }

    /// Connection id
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Resolved endpoint the connection subscribes to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Observed ready state
    pub fn ready_state(&self) -> ReadyState {
        self.state.ready_state()
    }

    /// Whether the connection is closed for good
    pub fn is_closed(&self) -> bool {
        self.ready_state() == ReadyState::Closed
    }

    /// Close the connection and stop its task
    pub fn close(&mut self) {
        if !self.state.close_requested() {
            debug!(connection = %self.id, url = %self.url, "closing upstream connection");
        }
        self.state.request_close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for UpstreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for UpstreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamHandle")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("ready_state", &self.ready_state())
            .finish()
    }
}
