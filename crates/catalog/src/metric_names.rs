//! Metric names and chart keys
//!
//! Chart keys are the metric name directly followed by its type tag
//! (see `TelemetryItem::chart_key`).

// ===== Probe names (switch) =====
pub const INGRESS_MATCH_CNT: &str = "PF_INGRESS_MATCH_CNT";
pub const INGRESS_START_HDR: &str = "PF_INGRESS_START_HDR_SIZE";
pub const INGRESS_END_HDR: &str = "PF_INGRESS_END_HDR_SIZE";
pub const EGRESS_START_CNT: &str = "PF_EGRESS_START_CNT";
pub const EGRESS_END_CNT: &str = "PF_EGRESS_END_CNT";
/// Average inter-packet arrival time, reported in nanoseconds
pub const INGRESS_JITTER_AVG: &str = "PF_INGRESS_JITTER_AVG";

// ===== Chart keys: default probes =====
pub const PROBE_INGRESS_MATCH_CNT_BYTE: &str = "PF_INGRESS_MATCH_CNTMETRIC_BYTES";
pub const PROBE_INGRESS_MATCH_CNT_PKT: &str = "PF_INGRESS_MATCH_CNTMETRIC_PKTS";
pub const PROBE_INGRESS_START_HDR_BYTE: &str = "PF_INGRESS_START_HDR_SIZEMETRIC_BYTES";
pub const PROBE_INGRESS_END_HDR_BYTE: &str = "PF_INGRESS_END_HDR_SIZEMETRIC_BYTES";
pub const PROBE_EGRESS_START_CNT_BYTE: &str = "PF_EGRESS_START_CNTMETRIC_BYTES";
pub const PROBE_EGRESS_START_CNT_PKTS: &str = "PF_EGRESS_START_CNTMETRIC_PKTS";
pub const PROBE_EGRESS_END_CNT_BYTE: &str = "PF_EGRESS_END_CNTMETRIC_BYTES";
pub const PROBE_INGRESS_JITTER: &str = "PF_INGRESS_JITTER_AVGMETRIC_EXT_VALUE";

// ===== Chart keys: traffic manager (PF_TM_<table>_<field>) =====
pub const PROBE_TM_INGRESS_DROP_PKT: &str = "PF_TM_ig_port_drop_count_packetsMETRIC_EXT_VALUE";
pub const PROBE_TM_EGRESS_DROP_PKT: &str = "PF_TM_eg_port_drop_count_packetsMETRIC_EXT_VALUE";
pub const PROBE_TM_INGRESS_USAGE_CELLS: &str = "PF_TM_ig_port_usage_cellsMETRIC_EXT_VALUE";
pub const PROBE_TM_EGRESS_USAGE_CELLS: &str = "PF_TM_eg_port_usage_cellsMETRIC_EXT_VALUE";
pub const PROBE_TM_PIPE_TOTAL_BUF_DROP: &str =
    "PF_TM_pipe_total_buffer_full_drop_packetsMETRIC_EXT_VALUE";
pub const PROBE_TM_PIPE_IG_FULL_BUF: &str = "PF_TM_pipe_ig_buf_full_drop_packetsMETRIC_EXT_VALUE";
pub const PROBE_TM_PIPE_EG_DROP_PKT: &str = "PF_TM_pipe_eg_total_drop_packetsMETRIC_EXT_VALUE";

// ===== Chart keys: NEO-Host (NIC performance counters) =====
pub const PROBE_NEO_TPT_MTT_L0_MISS: &str = "Level 0 MTT Cache MissMETRIC_EXT_VALUE";
pub const PROBE_NEO_TPT_MTT_L1_MISS: &str = "Level 1 MTT Cache MissMETRIC_EXT_VALUE";
pub const PROBE_NEO_TPT_MPT_L0_MISS: &str = "Level 0 MPT Cache MissMETRIC_EXT_VALUE";
pub const PROBE_NEO_TPT_MPT_L1_MISS: &str = "Level 1 MPT Cache MissMETRIC_EXT_VALUE";
pub const PROBE_NEO_PCI_BP: &str = "PCIe Internal Back PressureMETRIC_EXT_VALUE";
pub const PROBE_NEO_ICM_MISS: &str = "ICM Cache MissMETRIC_EXT_VALUE";
pub const PROBE_NEO_RX_FULL_0: &str = "RX Packet Buffer Full Port 0METRIC_EXT_VALUE";
pub const PROBE_NEO_RX_FULL_1: &str = "RX Packet Buffer Full Port 1METRIC_EXT_VALUE";
pub const PROBE_NEO_WQE_MISS: &str = "Receive WQE Cache MissMETRIC_EXT_VALUE";
pub const PROBE_NEO_TX_BW: &str = "TX BandWidthMETRIC_EXT_VALUE";
pub const PROBE_NEO_RX_BW: &str = "RX BandWidthMETRIC_EXT_VALUE";
pub const PROBE_NEO_TX_PKT: &str = "TX Packet RateMETRIC_EXT_VALUE";
pub const PROBE_NEO_RX_PKT: &str = "RX Packet RateMETRIC_EXT_VALUE";
pub const PROBE_NEO_PCI_OUT_BW: &str = "PCIe Outbound BW UtilizationMETRIC_EXT_VALUE";
pub const PROBE_NEO_PCI_IN_BW: &str = "PCIe Inbound BW UtilizationMETRIC_EXT_VALUE";

// ===== Chart keys: ethtool (NIC driver counters) =====
pub const PROBE_ETHTOOL_RX_DISCARD: &str = "rx_discards_phyMETRIC_EXT_VALUE";
pub const PROBE_ETHTOOL_TX_DISCARD: &str = "tx_discards_phyMETRIC_EXT_VALUE";
pub const PROBE_ETHTOOL_RX_PAUSE: &str = "rx_pause_ctrl_phyMETRIC_EXT_VALUE";
pub const PROBE_ETHTOOL_TX_PAUSE: &str = "tx_pause_ctrl_phyMETRIC_EXT_VALUE";
pub const PROBE_ETHTOOL_RX_OOB: &str = "rx_out_of_bufferMETRIC_EXT_VALUE";

// ===== Axis labels =====
pub const Y_AXIS_NAME_BYTE_RATE: &str = "Bytes/s";
pub const Y_AXIS_NAME_PKT_RATE: &str = "Packets/s";
pub const Y_AXIS_NAME_PKT_COUNT: &str = "Packets";
pub const Y_AXIS_NAME_TIME_SEC: &str = "Time (s)";
pub const Y_AXIS_NAME_CELL_COUNT: &str = "Cells";
pub const Y_AXIS_NAME_EVENTS_RATE: &str = "Events/s";
pub const Y_AXIS_NAME_EVENTS_COUNT: &str = "Events";
pub const Y_AXIS_NAME_CYCLES_RATE: &str = "Cycles/s";
pub const Y_AXIS_NAME_GIGABYTE_RATE: &str = "Gb/s";
