//! Chart registry
//!
//! Maps a chart key to its display metadata. The lookup is total: keys that
//! are not listed resolve to a fixed fallback entry.

use serde::Serialize;

use crate::metric_names::*;

/// Tick format used when a chart does not define one (d3-format specifier)
pub const DEFAULT_TICK_FORMAT: &str = "s";

/// Display metadata for one chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub title: &'static str,
    pub y_axis_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_format: Option<&'static str>,
}

impl ChartConfig {
    const fn new(title: &'static str, y_axis_name: &'static str) -> Self {
        Self {
            title,
            y_axis_name,
            tick_format: None,
        }
    }

    const fn with_tick(self, tick_format: &'static str) -> Self {
        Self {
            tick_format: Some(tick_format),
            ..self
        }
    }

    /// Entry returned for unknown keys
    pub const FALLBACK: ChartConfig = ChartConfig {
        title: "Unknown chart",
        y_axis_name: "Unknown scale",
        tick_format: Some(DEFAULT_TICK_FORMAT),
    };
}

/// Every key with a dedicated registry entry
pub const KNOWN_CHART_KEYS: &[&str] = &[
    PROBE_INGRESS_MATCH_CNT_BYTE,
    PROBE_INGRESS_MATCH_CNT_PKT,
    PROBE_INGRESS_START_HDR_BYTE,
    PROBE_INGRESS_END_HDR_BYTE,
    PROBE_EGRESS_START_CNT_BYTE,
    PROBE_EGRESS_START_CNT_PKTS,
    PROBE_EGRESS_END_CNT_BYTE,
    PROBE_INGRESS_JITTER,
    PROBE_TM_INGRESS_DROP_PKT,
    PROBE_TM_EGRESS_DROP_PKT,
    PROBE_TM_INGRESS_USAGE_CELLS,
    PROBE_TM_EGRESS_USAGE_CELLS,
    PROBE_TM_PIPE_TOTAL_BUF_DROP,
    PROBE_TM_PIPE_IG_FULL_BUF,
    PROBE_TM_PIPE_EG_DROP_PKT,
    PROBE_NEO_TPT_MTT_L0_MISS,
    PROBE_NEO_TPT_MTT_L1_MISS,
    PROBE_NEO_TPT_MPT_L0_MISS,
    PROBE_NEO_TPT_MPT_L1_MISS,
    PROBE_NEO_PCI_BP,
    PROBE_NEO_ICM_MISS,
    PROBE_NEO_RX_FULL_0,
    PROBE_NEO_RX_FULL_1,
    PROBE_NEO_WQE_MISS,
    PROBE_NEO_TX_BW,
    PROBE_NEO_RX_BW,
    PROBE_NEO_TX_PKT,
    PROBE_NEO_RX_PKT,
    PROBE_NEO_PCI_OUT_BW,
    PROBE_NEO_PCI_IN_BW,
    PROBE_ETHTOOL_RX_DISCARD,
    PROBE_ETHTOOL_TX_DISCARD,
    PROBE_ETHTOOL_RX_PAUSE,
    PROBE_ETHTOOL_TX_PAUSE,
    PROBE_ETHTOOL_RX_OOB,
];

/// Look up the chart metadata for a key, falling back to
/// [`ChartConfig::FALLBACK`] for unknown keys.
pub fn chart_config(key: &str) -> ChartConfig {
    match key {
        PROBE_INGRESS_MATCH_CNT_BYTE => {
            ChartConfig::new("Ingress byte counter", Y_AXIS_NAME_BYTE_RATE)
        }
        PROBE_INGRESS_MATCH_CNT_PKT => {
            ChartConfig::new("Ingress packet counter", Y_AXIS_NAME_PKT_RATE)
        }
        PROBE_INGRESS_START_HDR_BYTE => ChartConfig::new(
            "Start ingress header size counter",
            Y_AXIS_NAME_BYTE_RATE,
        ),
        PROBE_INGRESS_END_HDR_BYTE => {
            ChartConfig::new("End ingress header size counter", Y_AXIS_NAME_BYTE_RATE)
        }
        PROBE_EGRESS_START_CNT_BYTE => {
            ChartConfig::new("Start egress byte counter", Y_AXIS_NAME_BYTE_RATE)
        }
        PROBE_EGRESS_START_CNT_PKTS => {
            ChartConfig::new("Egress packet counter", Y_AXIS_NAME_PKT_RATE)
        }
        PROBE_EGRESS_END_CNT_BYTE => {
            ChartConfig::new("End egress byte counter", Y_AXIS_NAME_BYTE_RATE)
        }
        PROBE_INGRESS_JITTER => ChartConfig::new(
            "Ingress inter packet arrival average rate",
            Y_AXIS_NAME_TIME_SEC,
        )
        .with_tick("s"),
        PROBE_TM_INGRESS_DROP_PKT => ChartConfig::new(
            "Ingress packet drops from TM perspective",
            Y_AXIS_NAME_PKT_COUNT,
        ),
        PROBE_TM_EGRESS_DROP_PKT => ChartConfig::new(
            "Egress packet drops from TM perspective",
            Y_AXIS_NAME_PKT_COUNT,
        ),
        PROBE_TM_INGRESS_USAGE_CELLS => ChartConfig::new(
            "Port usage count in terms of number of memory cells usage from TM ingress perspective",
            Y_AXIS_NAME_CELL_COUNT,
        ),
        PROBE_TM_EGRESS_USAGE_CELLS => ChartConfig::new(
            "Port usage count in terms of number of memory cells usage from TM egress perspective",
            Y_AXIS_NAME_CELL_COUNT,
        ),
        PROBE_TM_PIPE_TOTAL_BUF_DROP => ChartConfig::new(
            "Number of packets which were dropped because of buffer full condition",
            Y_AXIS_NAME_PKT_COUNT,
        ),
        PROBE_TM_PIPE_IG_FULL_BUF => ChartConfig::new(
            "The number of packets which were dropped because of buffer full condition on ingress side",
            Y_AXIS_NAME_PKT_COUNT,
        ),
        PROBE_TM_PIPE_EG_DROP_PKT => ChartConfig::new(
            "The total number of packets which were dropped on egress side",
            Y_AXIS_NAME_PKT_COUNT,
        ),
        PROBE_NEO_TPT_MTT_L0_MISS => {
            ChartConfig::new("Level 0 MTT Cache Miss", Y_AXIS_NAME_EVENTS_RATE)
        }
        PROBE_NEO_TPT_MTT_L1_MISS => {
            ChartConfig::new("Level 1 MTT Cache Miss", Y_AXIS_NAME_EVENTS_RATE)
        }
        PROBE_NEO_TPT_MPT_L0_MISS => {
            ChartConfig::new("Level 0 MPT Cache Miss", Y_AXIS_NAME_EVENTS_RATE)
        }
        PROBE_NEO_TPT_MPT_L1_MISS => {
            ChartConfig::new("Level 1 MPT Cache Miss", Y_AXIS_NAME_EVENTS_RATE)
        }
        PROBE_NEO_PCI_BP => ChartConfig::new("PCIe Internal Back Pressure", Y_AXIS_NAME_CYCLES_RATE),
        PROBE_NEO_ICM_MISS => ChartConfig::new("ICM Cache Miss", Y_AXIS_NAME_EVENTS_RATE),
        PROBE_NEO_RX_FULL_0 => {
            ChartConfig::new("RX Packet Buffer Full Port 0", Y_AXIS_NAME_CYCLES_RATE)
        }
        PROBE_NEO_RX_FULL_1 => {
            ChartConfig::new("RX Packet Buffer Full Port 1", Y_AXIS_NAME_CYCLES_RATE)
        }
        PROBE_NEO_WQE_MISS => ChartConfig::new("Receive WQE Cache Miss", Y_AXIS_NAME_EVENTS_RATE),
        PROBE_NEO_TX_BW => ChartConfig::new("TX Bandwidth", Y_AXIS_NAME_GIGABYTE_RATE),
        PROBE_NEO_RX_BW => {
            ChartConfig::new("RX Bandwidth", Y_AXIS_NAME_GIGABYTE_RATE).with_tick(".1s")
        }
        PROBE_NEO_TX_PKT => ChartConfig::new("TX Packet Rate", Y_AXIS_NAME_PKT_RATE).with_tick(".1s"),
        PROBE_NEO_RX_PKT => ChartConfig::new("RX Packet Rate", Y_AXIS_NAME_PKT_RATE),
        PROBE_NEO_PCI_OUT_BW => {
            ChartConfig::new("PCIe Outbound Used BW", Y_AXIS_NAME_GIGABYTE_RATE)
        }
        PROBE_NEO_PCI_IN_BW => ChartConfig::new("PCIe Inbound Used BW", Y_AXIS_NAME_GIGABYTE_RATE),
        PROBE_ETHTOOL_RX_DISCARD => ChartConfig::new("RX packet discards", Y_AXIS_NAME_PKT_COUNT),
        PROBE_ETHTOOL_TX_DISCARD => ChartConfig::new("TX packet discards", Y_AXIS_NAME_PKT_COUNT),
        PROBE_ETHTOOL_RX_PAUSE => {
            ChartConfig::new("Link layer pause frames received", Y_AXIS_NAME_PKT_COUNT)
        }
        PROBE_ETHTOOL_TX_PAUSE => {
            ChartConfig::new("Link layer pause frames sent", Y_AXIS_NAME_PKT_COUNT)
        }
        PROBE_ETHTOOL_RX_OOB => {
            ChartConfig::new("Out of buffer events for RX", Y_AXIS_NAME_EVENTS_COUNT)
        }
        _ => ChartConfig::FALLBACK,
    }
}

/// Tick format for a key, `"s"` when the entry does not define one
pub fn tick_format_for(key: &str) -> &'static str {
    chart_config(key).tick_format.unwrap_or(DEFAULT_TICK_FORMAT)
}
