//! SseConnector - server-sent-events client over reqwest

use std::sync::Arc;
use std::time::Duration;

use contracts::{ConnectionId, UpstreamConfig};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace, warn};

use crate::connection::{ConnectionState, ReadyState, UpstreamHandle};
use crate::connector::{UpstreamConnector, UpstreamEvent};
use crate::error::{Result, UpstreamError};
use crate::sse::SseDecoder;

const EVENT_STREAM: &str = "text/event-stream";
const LAST_EVENT_ID: &str = "Last-Event-ID";

/// Connector opening real SSE subscriptions
#[derive(Debug, Clone)]
pub struct SseConnector {
    client: reqwest::Client,
    origin: Option<Url>,
    retry: Duration,
}

impl SseConnector {
    /// Create a connector from an existing client
    pub fn new(client: reqwest::Client, origin: Option<Url>, retry: Duration) -> Self {
        Self {
            client,
            origin,
            retry,
        }
    }

    /// Build a connector from the upstream configuration
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(UpstreamError::Client)?;

        let origin = config
            .origin
            .as_deref()
            .map(|origin| {
                Url::parse(origin).map_err(|e| UpstreamError::invalid_url(origin, e.to_string()))
            })
            .transpose()?;

        Ok(Self::new(
            client,
            origin,
            Duration::from_millis(config.retry_ms),
        ))
    }

    /// Resolve an endpoint, joining relative paths onto the origin
    pub fn resolve(&self, endpoint: &str) -> Result<Url> {
        match Url::parse(endpoint) {
            Ok(url) => Ok(url),
            Err(_) if endpoint.starts_with('/') => {
                let origin = self.origin.as_ref().ok_or_else(|| UpstreamError::MissingOrigin {
                    url: endpoint.to_string(),
                })?;
                origin
                    .join(endpoint)
                    .map_err(|e| UpstreamError::invalid_url(endpoint, e.to_string()))
            }
            Err(e) => Err(UpstreamError::invalid_url(endpoint, e.to_string())),
        }
    }
}

impl UpstreamConnector for SseConnector {
    fn open(
        &self,
        id: ConnectionId,
        url: &str,
        events: mpsc::Sender<UpstreamEvent>,
    ) -> UpstreamHandle {
        let state = ConnectionState::new(ReadyState::Connecting);
        let handle = UpstreamHandle::new(id, url, Arc::clone(&state));

        let resolved = match self.resolve(url) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(connection = %id, url, error = %e, "cannot open upstream connection");
                observability::record_upstream_failure(e.kind());
                state.set(ReadyState::Closed);
                return handle;
            }
        };

        let stream = EventStream {
            id,
            client: self.client.clone(),
            url: resolved,
            retry: self.retry,
            state,
            events,
        };
        handle.with_task(tokio::spawn(stream.run()))
    }
}

/// Why one response body stopped producing events
enum StreamEnd {
    /// Body ended or broke; reconnect
    Interrupted,
    /// Nobody is listening anymore
    ReceiverGone,
}

/// Task state for one connection
struct EventStream {
    id: ConnectionId,
    client: reqwest::Client,
    url: Url,
    retry: Duration,
    state: Arc<ConnectionState>,
    events: mpsc::Sender<UpstreamEvent>,
}

impl EventStream {
    #[instrument(name = "upstream_stream", skip(self), fields(connection = %self.id, url = %self.url))]
    async fn run(self) {
        let mut decoder = SseDecoder::new();
        let mut attempt: u64 = 0;

        loop {
            if !self.state.set(ReadyState::Connecting) {
                return;
            }
            if attempt > 0 {
                observability::record_upstream_reconnect();
            }
            attempt += 1;

            let last_event_id = decoder.last_event_id().map(str::to_owned);
            match self.connect(last_event_id.as_deref()).await {
                Ok(response) => {
                    if !self.state.set(ReadyState::Open) {
                        return;
                    }
                    info!("upstream stream open");
                    decoder.reset_stream();
                    if let StreamEnd::ReceiverGone = self.pump(response, &mut decoder).await {
                        debug!("event receiver dropped, stopping stream");
                        self.state.set(ReadyState::Closed);
                        return;
                    }
                    if !self.state.set(ReadyState::Connecting) {
                        return;
                    }
                }
                Err(e) if e.is_fatal() => {
                    warn!(error = %e, "upstream connection failed permanently");
                    observability::record_upstream_failure(e.kind());
                    self.state.set(ReadyState::Closed);
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "upstream connection failed, will retry");
                    observability::record_upstream_failure(e.kind());
                }
            }

            let delay = decoder.retry().unwrap_or(self.retry);
            debug!(delay_ms = delay.as_millis() as u64, "waiting before reconnect");
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect(&self, last_event_id: Option<&str>) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, EVENT_STREAM)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = last_event_id {
            request = request.header(LAST_EVENT_ID, id);
        }

        let response = request.send().await?;

        if response.status() != StatusCode::OK {
            return Err(UpstreamError::Status {
                url: self.url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        if !essence.eq_ignore_ascii_case(EVENT_STREAM) {
            return Err(UpstreamError::ContentType {
                url: self.url.to_string(),
                content_type: content_type.to_string(),
            });
        }

        Ok(response)
    }

    async fn pump(&self, response: reqwest::Response, decoder: &mut SseDecoder) -> StreamEnd {
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(error = %e, "upstream body read failed");
                    observability::record_upstream_failure("body");
                    return StreamEnd::Interrupted;
                }
            };
            decoder.feed(&chunk);

            while let Some(event) = decoder.next_event() {
                if event.event_type != "message" {
                    trace!(event_type = %event.event_type, "skipping non-message event");
                    continue;
                }
                observability::record_upstream_event();
                let event = UpstreamEvent {
                    connection_id: self.id,
                    data: event.data,
                };
                if self.events.send(event).await.is_err() {
                    return StreamEnd::ReceiverGone;
                }
            }
        }

        debug!("upstream body ended");
        StreamEnd::Interrupted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::{sleep, timeout};

    const SSE_HEAD: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";

    fn connector(origin: Option<&str>, retry_ms: u64) -> SseConnector {
        SseConnector::new(
            reqwest::Client::new(),
            origin.map(|o| Url::parse(o).unwrap()),
            Duration::from_millis(retry_ms),
        )
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).to_ascii_lowercase()
    }

    async fn wait_for(handle: &UpstreamHandle, state: ReadyState) {
        timeout(Duration::from_secs(5), async {
            while handle.ready_state() != state {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn test_resolve_relative_against_origin() {
        let connector = connector(Some("https://probe.local:8655"), 3000);
        let url = connector
            .resolve("/api/v1/events?stream=group3")
            .unwrap();
        assert_eq!(url.as_str(), "https://probe.local:8655/api/v1/events?stream=group3");

        let absolute = connector.resolve("http://other:1/x").unwrap();
        assert_eq!(absolute.host_str(), Some("other"));
    }

    #[test]
    fn test_resolve_relative_without_origin_fails() {
        let err = connector(None, 3000).resolve("/api/v1/events").unwrap_err();
        assert!(matches!(err, UpstreamError::MissingOrigin { .. }));
    }

    #[test]
    fn test_from_config_rejects_bad_origin() {
        let config = UpstreamConfig {
            origin: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(SseConnector::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_relative_endpoint_without_origin_is_closed() {
        let (tx, _rx) = mpsc::channel(4);
        let handle = connector(None, 3000).open(ConnectionId(1), "/api/v1/events", tx);
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_forwards_message_events() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            assert!(request.starts_with("get /api/v1/events?stream=group1 "));
            assert!(request.contains("accept: text/event-stream"));

            socket.write_all(SSE_HEAD.as_bytes()).await.unwrap();
            socket
                .write_all(b": hello\n\ndata: {\"n\":1}\n\nevent: other\ndata: skip\n\ndata: {\"n\":2}\n\n")
                .await
                .unwrap();
            sleep(Duration::from_secs(5)).await;
        });

        let (tx, mut rx) = mpsc::channel(4);
        let url = format!("http://{addr}/api/v1/events?stream=group1");
        let mut handle = connector(None, 3000).open(ConnectionId(9), &url, tx);

        let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.connection_id, ConnectionId(9));
        assert_eq!(first.data, "{\"n\":1}");
        let second = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(second.data, "{\"n\":2}");
        assert_eq!(handle.ready_state(), ReadyState::Open);

        handle.close();
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_error_status_closes_for_good() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await
                .unwrap();
        });

        let (tx, _rx) = mpsc::channel(4);
        let handle = connector(None, 10).open(ConnectionId(1), &format!("http://{addr}/x"), tx);
        wait_for(&handle, ReadyState::Closed).await;
    }

    #[tokio::test]
    async fn test_wrong_content_type_closes_for_good() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
                .await
                .unwrap();
        });

        let (tx, _rx) = mpsc::channel(4);
        let handle = connector(None, 10).open(ConnectionId(1), &format!("http://{addr}/x"), tx);
        wait_for(&handle, ReadyState::Closed).await;
    }

    #[tokio::test]
    async fn test_reconnects_with_last_event_id() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket.write_all(SSE_HEAD.as_bytes()).await.unwrap();
            socket
                .write_all(b"retry: 20\nid: 42\ndata: first\n\n")
                .await
                .unwrap();
            drop(socket);

            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            if !request.contains("last-event-id: 42") {
                return;
            }
            socket.write_all(SSE_HEAD.as_bytes()).await.unwrap();
            socket.write_all(b"data: second\n\n").await.unwrap();
            sleep(Duration::from_secs(5)).await;
        });

        let (tx, mut rx) = mpsc::channel(4);
        let handle = connector(None, 5000).open(ConnectionId(1), &format!("http://{addr}/x"), tx);

        let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.data, "first");
        let second = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(second.data, "second");
        assert!(!handle.is_closed());

        drop(handle);
        server.abort();
    }
}
