//! Multiplexer metrics
//!
//! Thin recorders over the `metrics` facade plus an in-memory aggregator for
//! what one viewer received.

use std::collections::BTreeMap;
use std::time::Instant;

use contracts::TelemetryMessage;
use metrics::{counter, gauge, histogram};

/// Record one `message` event read from the upstream stream
pub fn record_upstream_event() {
    counter!("probe_mux_upstream_events_total").increment(1);
}

/// Record a reconnect attempt of the upstream transport
pub fn record_upstream_reconnect() {
    counter!("probe_mux_upstream_reconnects_total").increment(1);
}

/// Record an upstream failure, labelled by kind (`status`, `request`, ...)
pub fn record_upstream_failure(kind: &'static str) {
    counter!("probe_mux_upstream_failures_total", "kind" => kind).increment(1);
}

/// Record an upstream payload that did not decode as a telemetry batch
pub fn record_malformed_payload() {
    counter!("probe_mux_malformed_payloads_total").increment(1);
}

/// Record an event from a connection that is no longer current
pub fn record_stale_event() {
    counter!("probe_mux_stale_events_total").increment(1);
}

/// Record how many items the normalizer rewrote in one batch
pub fn record_normalized_items(count: usize) {
    if count > 0 {
        counter!("probe_mux_normalized_items_total").increment(count as u64);
    }
}

/// Record a lifecycle transition (`opened`, `replaced`, `unchanged`, `closed`, ...)
pub fn record_connection_transition(kind: &'static str) {
    counter!("probe_mux_connection_transitions_total", "kind" => kind).increment(1);
}

/// Record a viewer command that was not understood
pub fn record_ignored_command() {
    counter!("probe_mux_ignored_commands_total").increment(1);
}

/// Record the outcome of one broadcast
pub fn record_broadcast(delivered: usize, dropped: usize) {
    counter!("probe_mux_broadcasts_total").increment(1);
    counter!("probe_mux_deliveries_total").increment(delivered as u64);
    if dropped > 0 {
        counter!("probe_mux_deliveries_dropped_total").increment(dropped as u64);
    }
    histogram!("probe_mux_broadcast_fanout").record(delivered as f64);
}

/// Record the current number of registered viewer ports
pub fn record_registered_ports(count: usize) {
    gauge!("probe_mux_registered_ports").set(count as f64);
}

/// Aggregates what a single viewer received
#[derive(Debug, Clone, Default)]
pub struct DeliveryAggregator {
    /// Total messages received
    pub total_messages: u64,

    /// Total metric items across all messages
    pub total_items: u64,

    /// Messages per device class wire name
    pub by_device_class: BTreeMap<String, u64>,

    /// Messages per source
    pub by_source: BTreeMap<String, u64>,

    /// Items per message
    pub batch_stats: RunningStats,

    /// Time between consecutive messages (ms)
    pub interarrival_stats: RunningStats,

    last_arrival: Option<Instant>,
}

impl DeliveryAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a message received now
    pub fn update(&mut self, message: &TelemetryMessage) {
        self.update_at(message, Instant::now());
    }

    /// Account for a message received at `at`
    pub fn update_at(&mut self, message: &TelemetryMessage, at: Instant) {
        self.total_messages += 1;
        self.total_items += message.metrics.len() as u64;
        *self
            .by_device_class
            .entry(message.device_class.as_str().to_string())
            .or_insert(0) += 1;
        *self.by_source.entry(message.source.clone()).or_insert(0) += 1;
        self.batch_stats.push(message.metrics.len() as f64);

        if let Some(last) = self.last_arrival {
            let gap = at.saturating_duration_since(last);
            self.interarrival_stats.push(gap.as_secs_f64() * 1000.0);
        }
        self.last_arrival = Some(at);
    }

    /// Build a summary report
    pub fn summary(&self) -> DeliverySummary {
        DeliverySummary {
            total_messages: self.total_messages,
            total_items: self.total_items,
            by_device_class: self.by_device_class.clone(),
            by_source: self.by_source.clone(),
            batch_size: StatsSummary::from(&self.batch_stats),
            interarrival_ms: StatsSummary::from(&self.interarrival_stats),
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Delivery summary
#[derive(Debug, Clone, Default)]
pub struct DeliverySummary {
    pub total_messages: u64,
    pub total_items: u64,
    pub by_device_class: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
    pub batch_size: StatsSummary,
    pub interarrival_ms: StatsSummary,
}

impl std::fmt::Display for DeliverySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Delivery Summary ===")?;
        writeln!(f, "Messages: {}", self.total_messages)?;
        writeln!(f, "Metric items: {}", self.total_items)?;
        writeln!(f, "Items per message: {}", self.batch_size)?;
        writeln!(f, "Inter-arrival (ms): {}", self.interarrival_ms)?;

        if !self.by_device_class.is_empty() {
            writeln!(f, "By device class:")?;
            for (class, count) in &self.by_device_class {
                writeln!(f, "  {}: {}", class, count)?;
            }
        }
        if !self.by_source.is_empty() {
            writeln!(f, "By source:")?;
            for (source, count) in &self.by_source {
                writeln!(f, "  {}: {}", source, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DeviceClass, TelemetryItem};
    use std::time::Duration;

    fn message(source: &str, class: DeviceClass, items: usize) -> TelemetryMessage {
        TelemetryMessage {
            source: source.to_string(),
            device_class: class,
            group_id: 1,
            metrics: (0..items)
                .map(|i| TelemetryItem {
                    session_id: 1,
                    metric_name: format!("m{i}"),
                    metric_type: "METRIC_PKTS".to_string(),
                    value: i as f64,
                    timestamp: "2024-01-01T00:00:00Z".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = DeliveryAggregator::new();
        let t0 = Instant::now();

        aggregator.update_at(&message("sw1", DeviceClass::Tofino, 4), t0);
        aggregator.update_at(
            &message("nic1", DeviceClass::Nic, 2),
            t0 + Duration::from_millis(250),
        );

        assert_eq!(aggregator.total_messages, 2);
        assert_eq!(aggregator.total_items, 6);
        assert_eq!(aggregator.by_device_class.get("HOSTTYPE_TOFINO"), Some(&1));
        assert_eq!(aggregator.by_source.get("nic1"), Some(&1));
        assert_eq!(aggregator.interarrival_stats.count(), 1);
        assert!((aggregator.interarrival_stats.mean() - 250.0).abs() < 1e-6);

        aggregator.reset();
        assert_eq!(aggregator.total_messages, 0);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = DeliveryAggregator::new();
        aggregator.update(&message("sw1", DeviceClass::Tofino, 3));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Messages: 1"));
        assert!(output.contains("HOSTTYPE_TOFINO: 1"));
        assert!(output.contains("Inter-arrival (ms): N/A"));
    }

    #[test]
    fn test_recorders_without_installed_recorder() {
        record_broadcast(3, 1);
        record_connection_transition("opened");
        record_registered_ports(2);
        record_normalized_items(0);
    }
}
