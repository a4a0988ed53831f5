//! TCP viewer gateway
//!
//! Each accepted connection becomes one viewer port. Inbound lines are JSON
//! control commands, outbound lines are JSON telemetry batches.

use std::future::Future;
use std::net::SocketAddr;

use multiplexer::{MultiplexerHandle, ViewerPort};
use serde_json::Value;
use tokio::io::{self, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, instrument, warn, Instrument};

use crate::error::{CliError, Result};

/// Longest control line a viewer may send, newline excluded
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Accepts viewer connections and bridges them to the multiplexer
pub struct Gateway {
    listener: TcpListener,
    handle: MultiplexerHandle,
}

impl Gateway {
    /// Bind the listener
    pub async fn bind(addr: SocketAddr, handle: MultiplexerHandle) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::gateway_bind(addr, e))?;
        Ok(Self { listener, handle })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves or the service stops.
    ///
    /// Sessions already running end on their own once the service closes
    /// their ports.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        info!(addr = %self.local_addr()?, "Viewer gateway listening");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Viewer gateway stopping");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "Failed to accept viewer connection");
                            continue;
                        }
                    };

                    let port = match self.handle.attach().await {
                        Ok(port) => port,
                        Err(e) => {
                            warn!(error = %e, %peer, "Multiplexer gone, closing gateway");
                            return Err(e.into());
                        }
                    };

                    let span = tracing::info_span!("viewer", port = %port.id(), %peer);
                    tokio::spawn(session(stream, port).instrument(span));
                }
            }
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Socket closed or failed
    Disconnected,
    /// Multiplexer closed the port
    StreamEnded,
    /// Viewer sent a line over the size limit
    LineTooLong,
}

/// Result of one bounded line read
enum LineRead {
    Line,
    Eof,
    TooLong,
}

/// Read into `buf` until a newline, giving up once it holds more than `max`
/// bytes. Partial reads stay in `buf`, so a cancelled call can be resumed.
async fn read_line_bounded(
    reader: &mut BufReader<OwnedReadHalf>,
    buf: &mut Vec<u8>,
    max: usize,
) -> io::Result<LineRead> {
    let remaining = (max + 1).saturating_sub(buf.len()) as u64;
    (&mut *reader).take(remaining).read_until(b'\n', buf).await?;

    if buf.last() == Some(&b'\n') {
        Ok(LineRead::Line)
    } else if buf.len() > max {
        Ok(LineRead::TooLong)
    } else {
        // Peer closed, possibly mid-line
        Ok(LineRead::Eof)
    }
}

#[instrument(level = "debug", skip_all)]
async fn session(stream: TcpStream, mut port: ViewerPort) {
    info!("Viewer connected");
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    let end = loop {
        tokio::select! {
            read = read_line_bounded(&mut reader, &mut buf, MAX_LINE_BYTES) => match read {
                Ok(LineRead::Line) => {
                    let line = String::from_utf8_lossy(&buf).trim().to_string();
                    buf.clear();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Value>(&line) {
                        Ok(raw) => {
                            if port.post(raw).await.is_err() {
                                break SessionEnd::StreamEnded;
                            }
                        }
                        Err(e) => debug!(error = %e, "Ignoring non-JSON line"),
                    }
                }
                Ok(LineRead::Eof) => break SessionEnd::Disconnected,
                Ok(LineRead::TooLong) => {
                    warn!(limit = MAX_LINE_BYTES, "Viewer line too long, closing session");
                    break SessionEnd::LineTooLong;
                }
                Err(e) => {
                    debug!(error = %e, "Viewer read failed");
                    break SessionEnd::Disconnected;
                }
            },
            message = port.recv() => match message {
                Some(message) => {
                    let mut line = match serde_json::to_vec(&*message) {
                        Ok(line) => line,
                        Err(e) => {
                            warn!(error = %e, "Failed to encode telemetry batch");
                            continue;
                        }
                    };
                    line.push(b'\n');
                    if let Err(e) = writer.write_all(&line).await {
                        debug!(error = %e, "Viewer write failed");
                        break SessionEnd::Disconnected;
                    }
                }
                None => break SessionEnd::StreamEnded,
            },
        }
    };

    let metrics = port.metrics();
    info!(
        reason = ?end,
        delivered = metrics.delivered_count,
        dropped = metrics.dropped_count,
        "Viewer disconnected"
    );
    port.detach().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DeviceClass, MuxConfig, TelemetryItem, TelemetryMessage, METRIC_EXT_VALUE};
    use multiplexer::MultiplexerBuilder;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::{sleep, timeout};
    use upstream::MockConnector;

    struct Harness {
        addr: SocketAddr,
        handle: MultiplexerHandle,
        mock: MockConnector,
        stop: Option<oneshot::Sender<()>>,
    }

    async fn start() -> Harness {
        let mock = MockConnector::new();
        let (service, handle) = MultiplexerBuilder::new(MuxConfig::default())
            .connector(mock.clone())
            .build()
            .unwrap();
        service.spawn();

        let gateway = Gateway::bind("127.0.0.1:0".parse().unwrap(), handle.clone())
            .await
            .unwrap();
        let addr = gateway.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        tokio::spawn(gateway.serve(async {
            let _ = stopped.await;
        }));

        Harness {
            addr,
            handle,
            mock,
            stop: Some(stop),
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    fn jitter(value: f64) -> TelemetryMessage {
        TelemetryMessage {
            source: "sw1".to_string(),
            device_class: DeviceClass::Tofino,
            group_id: 3,
            metrics: vec![TelemetryItem {
                session_id: 1,
                metric_name: "PF_INGRESS_JITTER_AVG".to_string(),
                metric_type: METRIC_EXT_VALUE.to_string(),
                value,
                timestamp: "2024-01-01T00:00:00Z".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_socket_viewer_receives_normalized_lines() {
        let harness = start().await;
        let stream = TcpStream::connect(harness.addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"not json\n{\"status\":\"CONNECT\",\"groupId\":\"3\"}\n")
            .await
            .unwrap();
        let mock = harness.mock.clone();
        wait_until(|| mock.open_count() == 1).await;
        assert_eq!(
            harness.mock.opened_urls(),
            ["https://localhost:8655/api/v1/events?stream=group3"]
        );

        assert!(harness.mock.emit(&jitter(2500.0)).await);
        let line = timeout(Duration::from_secs(2), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let received: TelemetryMessage = serde_json::from_str(&line).unwrap();
        assert_eq!(received.group_id, 3);
        assert_eq!(received.metrics[0].value, 3.0);
    }

    #[tokio::test]
    async fn test_disconnect_detaches_port() {
        let harness = start().await;
        let stream = TcpStream::connect(harness.addr).await.unwrap();

        let handle = harness.handle.clone();
        let mut attached = 0;
        for _ in 0..200 {
            attached = handle.stats().await.unwrap().ports;
            if attached == 1 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(attached, 1);

        drop(stream);
        let mut remaining = 1;
        for _ in 0..200 {
            remaining = handle.stats().await.unwrap().ports;
            if remaining == 0 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_oversized_line_closes_session() {
        let harness = start().await;
        let stream = TcpStream::connect(harness.addr).await.unwrap();
        let (mut reader, mut writer) = stream.into_split();

        let handle = harness.handle.clone();
        for _ in 0..200 {
            if handle.stats().await.unwrap().ports == 1 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }

        // Server may close before the whole write lands
        let _ = writer.write_all(&vec![b'x'; MAX_LINE_BYTES + 16]).await;

        let mut scratch = [0u8; 64];
        let read = timeout(Duration::from_secs(2), reader.read(&mut scratch))
            .await
            .unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));

        let mut remaining = 1;
        for _ in 0..200 {
            remaining = handle.stats().await.unwrap().ports;
            if remaining == 0 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(remaining, 0);
        assert_eq!(harness.mock.open_count(), 0);
    }

    #[tokio::test]
    async fn test_line_at_limit_accepted() {
        let harness = start().await;
        let stream = TcpStream::connect(harness.addr).await.unwrap();
        let (_reader, mut writer) = stream.into_split();

        let command = br#"{"status":"CONNECT","groupId":"3"}"#;
        let mut line = vec![b' '; MAX_LINE_BYTES - command.len()];
        line.extend_from_slice(command);
        line.push(b'\n');
        writer.write_all(&line).await.unwrap();

        let mock = harness.mock.clone();
        wait_until(|| mock.open_count() == 1).await;
        assert_eq!(harness.handle.stats().await.unwrap().ports, 1);
    }

    #[tokio::test]
    async fn test_service_shutdown_closes_socket() {
        let mut harness = start().await;
        let stream = TcpStream::connect(harness.addr).await.unwrap();
        let mut lines = BufReader::new(stream).lines();

        // Make sure the session is attached before stopping
        let handle = harness.handle.clone();
        for _ in 0..200 {
            if handle.stats().await.unwrap().ports == 1 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }

        harness.handle.shutdown().await;
        let end = timeout(Duration::from_secs(2), lines.next_line())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(end, None);

        if let Some(stop) = harness.stop.take() {
            let _ = stop.send(());
        }
    }
}
