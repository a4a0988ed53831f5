//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - Contract snapshots (wire shapes viewers and the server rely on)
//! - Viewer scenarios against an in-memory upstream
//! - The full stack over a real local SSE server

#[cfg(test)]
mod contract_tests {
    use contracts::{ControlCommand, GroupId, TelemetryMessage};
    use serde_json::json;

    #[test]
    fn test_command_wire_shape() {
        assert_eq!(
            ControlCommand::connect("7").to_value(),
            json!({"status": "CONNECT", "groupId": "7"})
        );
        assert_eq!(ControlCommand::Close.to_value(), json!({"status": "CLOSE"}));
    }

    #[test]
    fn test_numeric_group_id_accepted() {
        let command = ControlCommand::decode(&json!({"status": "CONNECT", "groupId": 7}));
        assert_eq!(command, Some(ControlCommand::Connect { group_id: GroupId::from(7u32) }));
    }

    #[test]
    fn test_message_wire_shape() {
        let message: TelemetryMessage = serde_json::from_value(json!({
            "source": "nic-2",
            "type": "HOSTTYPE_NIC",
            "groupId": 2,
            "metrics": [{
                "sessionId": 3,
                "metricName": "rx_discards_phy",
                "type": "METRIC_PKTS",
                "value": 12,
                "timestamp": "2024-01-01T00:00:00Z"
            }]
        }))
        .unwrap();
        let back = serde_json::to_value(&message).unwrap();
        assert_eq!(back["type"], "HOSTTYPE_NIC");
        assert_eq!(back["metrics"][0]["metricName"], "rx_discards_phy");
        assert_eq!(back["metrics"][0]["type"], "METRIC_PKTS");
    }

    #[test]
    fn test_unknown_chart_fallback() {
        let cfg = catalog::chart_config("PF_NOT_A_PROBEMETRIC_BYTES");
        let json = serde_json::to_value(cfg).unwrap();
        assert_eq!(
            json,
            json!({"title": "Unknown chart", "yAxisName": "Unknown scale", "tickFormat": "s"})
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        ClosePolicy, DeviceClass, MuxConfig, TelemetryItem, TelemetryMessage, METRIC_BYTES,
        METRIC_EXT_VALUE,
    };
    use multiplexer::{LifecycleState, MultiplexerBuilder, MultiplexerHandle, ViewerPort};
    use serde_json::json;
    use tokio::time::timeout;
    use upstream::MockConnector;

    const EVENTS: &str = "https://localhost:8655/api/v1/events?stream=group";

    fn start(config: MuxConfig) -> (MultiplexerHandle, MockConnector) {
        let mock = MockConnector::new();
        let (service, handle) = MultiplexerBuilder::new(config)
            .connector(mock.clone())
            .build()
            .unwrap();
        service.spawn();
        (handle, mock)
    }

    fn batch(group: u32, items: Vec<TelemetryItem>) -> TelemetryMessage {
        TelemetryMessage {
            source: format!("switch-{group}"),
            device_class: DeviceClass::Tofino,
            group_id: group,
            metrics: items,
        }
    }

    fn item(name: &str, metric_type: &str, value: f64) -> TelemetryItem {
        TelemetryItem {
            session_id: 1,
            metric_name: name.to_string(),
            metric_type: metric_type.to_string(),
            value,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    async fn recv(port: &mut ViewerPort) -> Arc<TelemetryMessage> {
        timeout(Duration::from_secs(2), port.recv())
            .await
            .expect("timed out waiting for a batch")
            .expect("port stream ended")
    }

    /// Round-trip through the service so every earlier request is processed
    async fn settle(handle: &MultiplexerHandle) {
        handle.stats().await.unwrap();
    }

    #[tokio::test]
    async fn test_scenario_a_connect_and_normalize() {
        let (handle, mock) = start(MuxConfig::default());
        let mut viewer = handle.attach().await.unwrap();

        viewer
            .post(json!({"status": "CONNECT", "groupId": "7"}))
            .await
            .unwrap();
        settle(&handle).await;
        assert_eq!(mock.opened_urls(), [format!("{EVENTS}7")]);

        mock.emit(&batch(
            7,
            vec![
                item("PF_INGRESS_JITTER_AVG", METRIC_EXT_VALUE, 4200.0),
                item("PF_INGRESS_MATCH_CNT", METRIC_BYTES, 4200.0),
            ],
        ))
        .await;

        let received = recv(&mut viewer).await;
        assert_eq!(received.metrics[0].value, 4.0);
        assert_eq!(received.metrics[1].value, 4200.0);
    }

    #[tokio::test]
    async fn test_scenario_b_viewers_share_one_upstream() {
        let (handle, mock) = start(MuxConfig::default());
        let mut a = handle.attach().await.unwrap();
        let mut b = handle.attach().await.unwrap();

        a.connect("7").await.unwrap();
        b.connect("7").await.unwrap();
        settle(&handle).await;
        assert_eq!(mock.open_count(), 1);
        assert_eq!(mock.live_count(), 1);

        mock.emit(&batch(7, vec![item("PF_EGRESS_END_CNT", METRIC_BYTES, 10.0)]))
            .await;
        assert_eq!(recv(&mut a).await.group_id, 7);
        assert_eq!(recv(&mut b).await.group_id, 7);
    }

    #[tokio::test]
    async fn test_scenario_c_group_switch_replaces_upstream() {
        let (handle, mock) = start(MuxConfig::default());
        let mut a = handle.attach().await.unwrap();
        let mut b = handle.attach().await.unwrap();

        a.connect("1").await.unwrap();
        settle(&handle).await;
        let group_one = mock.latest_id().unwrap();

        b.connect("2").await.unwrap();
        settle(&handle).await;
        assert_eq!(mock.open_count(), 2);
        assert_eq!(mock.close_count(), 1);
        assert_eq!(mock.live_count(), 1);
        assert_eq!(mock.opened_urls()[1], format!("{EVENTS}2"));

        // Late event from the replaced connection is discarded
        let late = serde_json::to_string(&batch(1, Vec::new())).unwrap();
        mock.emit_to(group_one, late).await;
        mock.emit(&batch(2, Vec::new())).await;

        assert_eq!(recv(&mut a).await.group_id, 2);
        assert_eq!(recv(&mut b).await.group_id, 2);
        assert!(a.try_recv().is_none());

        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.stale_events, 1);
    }

    #[tokio::test]
    async fn test_scenario_d_global_close_and_reopen() {
        let (handle, mock) = start(MuxConfig::default());
        let a = handle.attach().await.unwrap();
        let b = handle.attach().await.unwrap();

        a.connect("3").await.unwrap();
        b.connect("3").await.unwrap();
        b.close_stream().await.unwrap();

        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.lifecycle, LifecycleState::Closed);
        assert_eq!(stats.ports, 2);
        assert_eq!(mock.live_count(), 0);

        a.connect("3").await.unwrap();
        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.lifecycle, LifecycleState::Open);
        assert_eq!(mock.open_count(), 2);
        assert_eq!(mock.live_count(), 1);
    }

    #[tokio::test]
    async fn test_ref_counted_close_keeps_stream_for_others() {
        let mut config = MuxConfig::default();
        config.lifecycle.close_policy = ClosePolicy::RefCounted;
        let (handle, mock) = start(config);

        let a = handle.attach().await.unwrap();
        let mut b = handle.attach().await.unwrap();
        a.connect("3").await.unwrap();
        b.connect("3").await.unwrap();
        a.close_stream().await.unwrap();
        settle(&handle).await;
        assert_eq!(mock.live_count(), 1);

        mock.emit(&batch(3, Vec::new())).await;
        assert_eq!(recv(&mut b).await.group_id, 3);

        drop(b);
        settle(&handle).await;
        assert_eq!(mock.live_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_viewer_does_not_block_others() {
        let mut config = MuxConfig::default();
        config.ports.queue_capacity = 2;
        let (handle, mock) = start(config);

        let mut fast = handle.attach().await.unwrap();
        let slow = handle.attach().await.unwrap();
        fast.connect("5").await.unwrap();
        settle(&handle).await;

        for _ in 0..2 {
            mock.emit(&batch(5, Vec::new())).await;
            recv(&mut fast).await;
        }
        for _ in 0..3 {
            mock.emit(&batch(5, Vec::new())).await;
            recv(&mut fast).await;
        }

        let metrics = slow.metrics();
        assert_eq!(metrics.delivered_count, 2);
        assert_eq!(metrics.dropped_count, 3);
        assert_eq!(fast.metrics().dropped_count, 0);
    }

    #[tokio::test]
    async fn test_config_file_drives_service() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[upstream]\ndev_origin = \"http://10.9.8.7:8655/\"\n\n[lifecycle]\nclose_policy = \"ref_counted\""
        )
        .unwrap();
        let config = config_loader::ConfigLoader::load_from_path(file.path()).unwrap();

        let (handle, mock) = start(config);
        let port = handle.attach().await.unwrap();
        port.connect(9u32).await.unwrap();
        settle(&handle).await;
        assert_eq!(
            mock.opened_urls(),
            ["http://10.9.8.7:8655/api/v1/events?stream=group9"]
        );
    }

    #[tokio::test]
    async fn test_viewer_summary_over_synthetic_stream() {
        let mock = MockConnector::synthetic(Duration::from_millis(5));
        let (service, handle) = MultiplexerBuilder::new(MuxConfig::default())
            .connector(mock)
            .build()
            .unwrap();
        service.spawn();

        let mut port = handle.attach().await.unwrap();
        port.connect("4").await.unwrap();

        let mut aggregator = observability::DeliveryAggregator::new();
        for _ in 0..5 {
            aggregator.update(&*recv(&mut port).await);
        }
        let summary = aggregator.summary();
        assert_eq!(summary.total_messages, 5);
        assert_eq!(summary.by_source.get("mock-4"), Some(&5));

        handle.shutdown().await;
        assert!(timeout(Duration::from_secs(2), port.recv()).await.unwrap().is_none());
    }
}

#[cfg(test)]
mod sse_stack_tests {
    use std::time::Duration;

    use contracts::MuxConfig;
    use multiplexer::MultiplexerBuilder;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    const BATCH: &str = r#"{"source":"sw1","type":"HOSTTYPE_TOFINO","groupId":6,"metrics":[{"sessionId":1,"metricName":"PF_INGRESS_JITTER_AVG","type":"METRIC_EXT_VALUE","value":7600,"timestamp":"2024-01-01T00:00:00Z"}]}"#;

    /// Serves one SSE response carrying a comment, a non-message event and a batch
    async fn serve_once(listener: TcpListener) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            request.extend_from_slice(&chunk[..n]);
        }
        let request = String::from_utf8_lossy(&request).to_string();

        let body = format!(": hello\n\nevent: ping\ndata: x\n\ndata: {BATCH}\n\n");
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncache-control: no-cache\r\n\r\n{body}"
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        // Keep the stream open long enough for the client to read it
        tokio::time::sleep(Duration::from_secs(2)).await;
        request
    }

    #[tokio::test]
    async fn test_full_stack_over_sse() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(listener));

        let mut config = MuxConfig::default();
        config.upstream.dev_origin = format!("http://{addr}");
        let (service, handle) = MultiplexerBuilder::new(config).build().unwrap();
        service.spawn();

        let mut port = handle.attach().await.unwrap();
        port.connect("6").await.unwrap();

        let message = timeout(Duration::from_secs(5), port.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.group_id, 6);
        assert_eq!(message.metrics[0].value, 8.0);

        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.messages_received, 1);
        assert_eq!(stats.malformed_payloads, 0);

        handle.shutdown().await;
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v1/events?stream=group6 "));
        assert!(request.to_ascii_lowercase().contains("accept: text/event-stream"));
    }
}
