//! Multiplexer - the service actor
//!
//! One task owns the control handler (and through it the lifecycle manager)
//! and the port registry. Viewers and the upstream transport reach it only
//! through channels, so every state change happens on this task.

use std::sync::Arc;

use contracts::{ContractError, MuxConfig, PortId, TelemetryMessage};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use upstream::{ReadyState, SseConnector, UpstreamConnector, UpstreamEvent};

use crate::control::ControlHandler;
use crate::error::MultiplexerError;
use crate::lifecycle::{LifecycleManager, LifecycleState, Transition};
use crate::metrics::{PortMetrics, PortMetricsSnapshot};
use crate::normalize::normalize;
use crate::port::{PortHandle, ViewerPort};
use crate::registry::PortRegistry;
use crate::selector::StreamSelector;

/// Capacity of the request channel shared by all handles and ports
const REQUEST_CAPACITY: usize = 256;

/// Messages into the service task
pub(crate) enum Request {
    Attach {
        reply: oneshot::Sender<Attached>,
    },
    Command {
        port: PortId,
        raw: Value,
    },
    Detach {
        port: PortId,
    },
    Stats {
        reply: oneshot::Sender<MultiplexerStats>,
    },
    Shutdown,
}

/// Service's answer to an attach request
pub(crate) struct Attached {
    id: PortId,
    rx: mpsc::Receiver<Arc<TelemetryMessage>>,
    metrics: Arc<PortMetrics>,
}

/// Service statistics
#[derive(Debug, Clone)]
pub struct MultiplexerStats {
    /// Registered ports
    pub ports: usize,
    /// Ports that issued CONNECT and still want the stream
    pub interested_ports: usize,
    /// Lifecycle state
    pub lifecycle: LifecycleState,
    /// Endpoint of the held connection
    pub connection_url: Option<String>,
    /// Transport state of the held connection
    pub ready_state: Option<ReadyState>,
    /// Upstream events from the current connection
    pub messages_received: u64,
    /// Events that failed to decode
    pub malformed_payloads: u64,
    /// Events from replaced connections, discarded
    pub stale_events: u64,
    /// Per-port delivery counters
    pub port_metrics: Vec<(PortId, PortMetricsSnapshot)>,
}

#[derive(Debug, Default)]
struct Counters {
    messages_received: u64,
    malformed_payloads: u64,
    stale_events: u64,
}

/// Builder for creating a Multiplexer
pub struct MultiplexerBuilder {
    config: MuxConfig,
    connector: Option<Arc<dyn UpstreamConnector>>,
}

impl MultiplexerBuilder {
    pub fn new(config: MuxConfig) -> Self {
        Self {
            config,
            connector: None,
        }
    }

    /// Use a specific connector instead of the SSE client
    pub fn connector(mut self, connector: impl UpstreamConnector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Build the service and its handle. The service does nothing until
    /// [`Multiplexer::run`] or [`Multiplexer::spawn`].
    #[instrument(name = "multiplexer_build", skip(self))]
    pub fn build(self) -> Result<(Multiplexer, MultiplexerHandle), MultiplexerError> {
        let connector = match self.connector {
            Some(connector) => connector,
            None => Arc::new(SseConnector::from_config(&self.config.upstream)?),
        };

        let (events_tx, events_rx) = mpsc::channel(self.config.upstream.event_capacity);
        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_CAPACITY);

        let lifecycle = LifecycleManager::new(connector, events_tx);
        let control = ControlHandler::new(
            StreamSelector::from_config(&self.config.upstream),
            self.config.lifecycle.close_policy,
            lifecycle,
        );

        let service = Multiplexer {
            control,
            registry: PortRegistry::new(),
            requests_rx,
            events_rx,
            queue_capacity: self.config.ports.queue_capacity,
            next_port: 1,
            counters: Counters::default(),
        };
        let handle = MultiplexerHandle { tx: requests_tx };

        Ok((service, handle))
    }
}

/// The service actor
pub struct Multiplexer {
    control: ControlHandler,
    registry: PortRegistry,
    requests_rx: mpsc::Receiver<Request>,
    events_rx: mpsc::Receiver<UpstreamEvent>,
    queue_capacity: usize,
    next_port: u64,
    counters: Counters,
}

impl Multiplexer {
    /// Run the service loop.
    ///
    /// Returns on shutdown or once every handle and port has been dropped.
    #[instrument(name = "multiplexer_run", skip(self))]
    pub async fn run(mut self) {
        info!(
            base = self.control.selector().base(),
            policy = ?self.control.policy(),
            queue_capacity = self.queue_capacity,
            "Multiplexer started"
        );

        loop {
            tokio::select! {
                biased;

                request = self.requests_rx.recv() => match request {
                    Some(Request::Shutdown) | None => break,
                    Some(request) => self.handle_request(request),
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
        }

        self.shutdown();
        info!(
            messages = self.counters.messages_received,
            malformed = self.counters.malformed_payloads,
            stale = self.counters.stale_events,
            "Multiplexer stopped"
        );
    }

    /// Spawn the service as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::Attach { reply } => {
                let attached = self.attach();
                if reply.send(attached).is_err() {
                    debug!("attach requester went away");
                }
            }
            Request::Command { port, raw } => {
                if !self.registry.contains(port) {
                    debug!(%port, "command from unregistered port ignored");
                    return;
                }
                if let Some(transition) = self.control.handle(port, &raw) {
                    record_transition(transition);
                }
            }
            Request::Detach { port } => self.detach(port),
            Request::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
            Request::Shutdown => {}
        }
    }

    fn attach(&mut self) -> Attached {
        let id = PortId(self.next_port);
        self.next_port += 1;

        let (handle, rx, metrics) = PortHandle::channel(id, self.queue_capacity);
        self.registry.register(handle);
        observability::record_registered_ports(self.registry.len());
        info!(port = %id, ports = self.registry.len(), "viewer attached");

        Attached { id, rx, metrics }
    }

    fn detach(&mut self, port: PortId) {
        if self.registry.unregister(port).is_none() {
            return;
        }
        observability::record_registered_ports(self.registry.len());
        info!(%port, ports = self.registry.len(), "viewer detached");

        if let Some(transition) = self.control.port_detached(port) {
            record_transition(transition);
        }
    }

    fn handle_event(&mut self, event: UpstreamEvent) {
        if !self.control.lifecycle().is_current(event.connection_id) {
            self.counters.stale_events += 1;
            observability::record_stale_event();
            debug!(connection = %event.connection_id, "discarding event from replaced connection");
            return;
        }
        self.counters.messages_received += 1;

        let mut message = match decode_payload(&event.data) {
            Ok(message) => message,
            Err(e) => {
                self.counters.malformed_payloads += 1;
                observability::record_malformed_payload();
                warn!(connection = %event.connection_id, error = %e, "malformed telemetry payload dropped");
                return;
            }
        };

        observability::record_normalized_items(normalize(&mut message));

        let report = self.registry.broadcast(Arc::new(message));
        observability::record_broadcast(report.delivered, report.dropped);

        if !report.closed.is_empty() {
            observability::record_registered_ports(self.registry.len());
            for port in report.closed {
                info!(%port, "viewer gone, port removed");
                if let Some(transition) = self.control.port_detached(port) {
                    record_transition(transition);
                }
            }
        }
    }

    fn stats(&self) -> MultiplexerStats {
        let lifecycle = self.control.lifecycle();
        MultiplexerStats {
            ports: self.registry.len(),
            interested_ports: self.control.interested_ports(),
            lifecycle: lifecycle.state(),
            connection_url: lifecycle.current_url().map(str::to_string),
            ready_state: lifecycle.ready_state(),
            messages_received: self.counters.messages_received,
            malformed_payloads: self.counters.malformed_payloads,
            stale_events: self.counters.stale_events,
            port_metrics: self.registry.metrics(),
        }
    }

    fn shutdown(&mut self) {
        record_transition(self.control.shutdown());
        self.registry.clear();
        observability::record_registered_ports(0);
    }
}

/// Decode one upstream event body into a telemetry message
fn decode_payload(data: &str) -> Result<TelemetryMessage, MultiplexerError> {
    serde_json::from_str(data).map_err(|e| ContractError::payload_parse(e.to_string()).into())
}

fn record_transition(transition: Transition) {
    observability::record_connection_transition(transition.kind());
}

/// Cloneable handle to a running multiplexer
#[derive(Clone)]
pub struct MultiplexerHandle {
    tx: mpsc::Sender<Request>,
}

impl MultiplexerHandle {
    /// Attach a new viewer port
    pub async fn attach(&self) -> Result<ViewerPort, MultiplexerError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request::Attach { reply })
            .await
            .map_err(|_| MultiplexerError::ServiceStopped)?;
        let attached = response
            .await
            .map_err(|_| MultiplexerError::ServiceStopped)?;

        Ok(ViewerPort::new(
            attached.id,
            self.tx.clone(),
            attached.rx,
            attached.metrics,
        ))
    }

    /// Current service statistics
    pub async fn stats(&self) -> Result<MultiplexerStats, MultiplexerError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request::Stats { reply })
            .await
            .map_err(|_| MultiplexerError::ServiceStopped)?;
        response.await.map_err(|_| MultiplexerError::ServiceStopped)
    }

    /// Stop the service: closes the upstream and ends every viewer stream
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Request::Shutdown).await;
    }

    /// Whether the service task is gone
    pub fn is_stopped(&self) -> bool {
        self.tx.is_closed()
    }
}
