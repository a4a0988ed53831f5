//! Mock upstream connector
//!
//! Records every open and close and lets the caller push events by hand.
//! Optionally generates synthetic telemetry for offline runs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use catalog::metric_names::{EGRESS_END_CNT, INGRESS_JITTER_AVG, INGRESS_MATCH_CNT};
use contracts::{
    ConnectionId, DeviceClass, TelemetryItem, TelemetryMessage, METRIC_BYTES, METRIC_EXT_VALUE,
    METRIC_PKTS,
};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::connection::{ConnectionState, ReadyState, UpstreamHandle};
use crate::connector::{UpstreamConnector, UpstreamEvent};

/// Mock connector configuration
#[derive(Debug, Clone, Default)]
pub struct MockConnectorConfig {
    /// Emit a synthetic batch on every open connection at this interval
    pub synthetic_interval: Option<Duration>,

    /// Device class of synthetic batches
    pub device_class: Option<DeviceClass>,
}

struct MockConnection {
    id: ConnectionId,
    url: String,
    state: Arc<ConnectionState>,
    events: mpsc::Sender<UpstreamEvent>,
}

#[derive(Default)]
struct MockState {
    connections: Vec<MockConnection>,
}

/// In-memory connector. Clones share the same recorded state.
#[derive(Clone, Default)]
pub struct MockConnector {
    config: MockConnectorConfig,
    inner: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Create a silent mock connector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock connector with the given configuration
    pub fn with_config(config: MockConnectorConfig) -> Self {
        Self {
            config,
            inner: Arc::default(),
        }
    }

    /// Create a mock connector emitting synthetic batches at `interval`
    pub fn synthetic(interval: Duration) -> Self {
        Self::with_config(MockConnectorConfig {
            synthetic_interval: Some(interval),
            device_class: None,
        })
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of connections ever opened
    pub fn open_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Number of connections closed by their owner
    pub fn close_count(&self) -> usize {
        self.lock()
            .connections
            .iter()
            .filter(|c| c.state.close_requested())
            .count()
    }

    /// Number of connections not yet closed
    pub fn live_count(&self) -> usize {
        self.lock()
            .connections
            .iter()
            .filter(|c| c.state.ready_state() != ReadyState::Closed)
            .count()
    }

    /// URLs in open order
    pub fn opened_urls(&self) -> Vec<String> {
        self.lock().connections.iter().map(|c| c.url.clone()).collect()
    }

    /// Id of the most recently opened connection
    pub fn latest_id(&self) -> Option<ConnectionId> {
        self.lock().connections.last().map(|c| c.id)
    }

    /// Push a message on the most recent live connection.
    ///
    /// Returns false if there is none or its receiver is gone.
    pub async fn emit(&self, message: &TelemetryMessage) -> bool {
        match serde_json::to_string(message) {
            Ok(data) => self.emit_raw(data).await,
            Err(_) => false,
        }
    }

    /// Push raw event data on the most recent live connection
    pub async fn emit_raw(&self, data: impl Into<String>) -> bool {
        let target = {
            let state = self.lock();
            state
                .connections
                .iter()
                .rev()
                .find(|c| c.state.ready_state() != ReadyState::Closed)
                .map(|c| (c.id, c.events.clone()))
        };
        match target {
            Some((id, events)) => send(&events, id, data.into()).await,
            None => false,
        }
    }

    /// Push raw event data on a specific connection, closed or not
    pub async fn emit_to(&self, id: ConnectionId, data: impl Into<String>) -> bool {
        let events = {
            let state = self.lock();
            state
                .connections
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.events.clone())
        };
        match events {
            Some(events) => send(&events, id, data.into()).await,
            None => false,
        }
    }

    /// Fail the most recent live connection permanently, as if the server
    /// had rejected it
    pub fn terminate(&self) -> bool {
        let state = self.lock();
        match state
            .connections
            .iter()
            .rev()
            .find(|c| c.state.ready_state() != ReadyState::Closed)
        {
            Some(conn) => {
                debug!(connection = %conn.id, "mock connection terminated");
                conn.state.set(ReadyState::Closed)
            }
            None => false,
        }
    }
}

async fn send(events: &mpsc::Sender<UpstreamEvent>, id: ConnectionId, data: String) -> bool {
    events
        .send(UpstreamEvent {
            connection_id: id,
            data,
        })
        .await
        .is_ok()
}

impl UpstreamConnector for MockConnector {
    fn open(
        &self,
        id: ConnectionId,
        url: &str,
        events: mpsc::Sender<UpstreamEvent>,
    ) -> UpstreamHandle {
        let state = ConnectionState::new(ReadyState::Open);
        debug!(connection = %id, url, "mock connection opened");

        self.lock().connections.push(MockConnection {
            id,
            url: url.to_string(),
            state: Arc::clone(&state),
            events: events.clone(),
        });

        let handle = UpstreamHandle::new(id, url, Arc::clone(&state));
        match self.config.synthetic_interval {
            Some(interval) => {
                let generator = SyntheticSource {
                    id,
                    group_id: group_from_url(url),
                    device_class: self.config.device_class.unwrap_or(DeviceClass::Tofino),
                    interval,
                    state,
                    events,
                };
                handle.with_task(tokio::spawn(generator.run()))
            }
            None => handle,
        }
    }
}

/// Group number from a `...stream=group<N>` endpoint, 0 if absent
fn group_from_url(url: &str) -> u32 {
    url.rsplit_once("stream=group")
        .and_then(|(_, rest)| {
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .unwrap_or(0)
}

/// Synthetic telemetry generator driving one mock connection
struct SyntheticSource {
    id: ConnectionId,
    group_id: u32,
    device_class: DeviceClass,
    interval: Duration,
    state: Arc<ConnectionState>,
    events: mpsc::Sender<UpstreamEvent>,
}

impl SyntheticSource {
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        let mut seq: u64 = 0;

        while self.state.ready_state() == ReadyState::Open {
            ticker.tick().await;
            seq += 1;

            let message = self.batch(seq);
            let data = match serde_json::to_string(&message) {
                Ok(data) => data,
                Err(_) => break,
            };
            if !send(&self.events, self.id, data).await {
                debug!(connection = %self.id, "synthetic source receiver gone");
                break;
            }
            trace!(connection = %self.id, seq, "synthetic batch sent");
        }
    }

    fn batch(&self, seq: u64) -> TelemetryMessage {
        let timestamp = format!("1970-01-01T00:00:{:02}Z", seq % 60);
        let item = |name: &str, metric_type: &str, value: f64| TelemetryItem {
            session_id: 1,
            metric_name: name.to_string(),
            metric_type: metric_type.to_string(),
            value,
            timestamp: timestamp.clone(),
        };
        let wave = (seq % 10) as f64;

        TelemetryMessage {
            source: format!("mock-{}", self.group_id),
            device_class: self.device_class,
            group_id: self.group_id,
            metrics: vec![
                item(INGRESS_MATCH_CNT, METRIC_BYTES, 1500.0 * (10.0 + wave)),
                item(INGRESS_MATCH_CNT, METRIC_PKTS, 10.0 + wave),
                item(EGRESS_END_CNT, METRIC_BYTES, 1400.0 * (10.0 + wave)),
                item(INGRESS_JITTER_AVG, METRIC_EXT_VALUE, 250_000.0 + 1000.0 * wave),
            ],
        }
    }
}
