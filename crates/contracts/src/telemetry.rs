//! TelemetryMessage - upstream transport unit
//!
//! One message per upstream push event; produced by the telemetry server,
//! consumed by every registered viewer port.

use serde::{Deserialize, Serialize};

/// Metric type tag: byte counter
pub const METRIC_BYTES: &str = "METRIC_BYTES";
/// Metric type tag: packet counter
pub const METRIC_PKTS: &str = "METRIC_PKTS";
/// Metric type tag: extended register value
pub const METRIC_EXT_VALUE: &str = "METRIC_EXT_VALUE";

/// Class of the monitored device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    /// Programmable switch
    #[serde(rename = "HOSTTYPE_TOFINO")]
    Tofino,
    /// Network interface card
    #[serde(rename = "HOSTTYPE_NIC")]
    Nic,
}

impl DeviceClass {
    /// Wire name of the device class
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tofino => "HOSTTYPE_TOFINO",
            Self::Nic => "HOSTTYPE_NIC",
        }
    }

    /// All device classes, in dashboard order
    pub fn all() -> [DeviceClass; 2] {
        [Self::Tofino, Self::Nic]
    }
}

/// One sampled counter reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryItem {
    /// Probe session the reading belongs to
    pub session_id: u32,

    /// Probe / counter name
    pub metric_name: String,

    /// Metric type tag (`METRIC_BYTES`, `METRIC_PKTS`, ...)
    #[serde(rename = "type")]
    pub metric_type: String,

    /// Sampled value
    pub value: f64,

    /// Sample time as sent by the server (RFC 3339)
    pub timestamp: String,
}

impl TelemetryItem {
    /// Key used by the chart registry: metric name followed by type tag
    pub fn chart_key(&self) -> String {
        format!("{}{}", self.metric_name, self.metric_type)
    }
}

/// One telemetry batch for a device group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryMessage {
    /// Name of the emitting endpoint
    pub source: String,

    /// Device class of the source
    #[serde(rename = "type")]
    pub device_class: DeviceClass,

    /// Group the batch was published to
    pub group_id: u32,

    /// Sampled readings
    #[serde(default)]
    pub metrics: Vec<TelemetryItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIRE: &str = r#"{
        "source": "tofino-1",
        "type": "HOSTTYPE_TOFINO",
        "groupId": 7,
        "metrics": [
            {"sessionId": 1, "type": "METRIC_BYTES", "value": 1500, "metricName": "PF_INGRESS_MATCH_CNT", "timestamp": "2023-06-01T10:00:00Z"}
        ]
    }"#;

    #[test]
    fn test_decode_wire_message() {
        let msg: TelemetryMessage = serde_json::from_str(WIRE).unwrap();
        assert_eq!(msg.source, "tofino-1");
        assert_eq!(msg.device_class, DeviceClass::Tofino);
        assert_eq!(msg.group_id, 7);
        assert_eq!(msg.metrics.len(), 1);
        assert_eq!(msg.metrics[0].metric_type, METRIC_BYTES);
        assert_eq!(msg.metrics[0].value, 1500.0);
    }

    #[test]
    fn test_encode_uses_wire_names() {
        let msg: TelemetryMessage = serde_json::from_str(WIRE).unwrap();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "HOSTTYPE_TOFINO");
        assert_eq!(value["groupId"], 7);
        assert_eq!(value["metrics"][0]["metricName"], "PF_INGRESS_MATCH_CNT");
        assert_eq!(value["metrics"][0]["sessionId"], 1);
    }

    #[test]
    fn test_unknown_device_class_rejected() {
        let bad = WIRE.replace("HOSTTYPE_TOFINO", "HOSTTYPE_FPGA");
        assert!(serde_json::from_str::<TelemetryMessage>(&bad).is_err());
    }

    #[test]
    fn test_chart_key() {
        let msg: TelemetryMessage = serde_json::from_str(WIRE).unwrap();
        assert_eq!(msg.metrics[0].chart_key(), "PF_INGRESS_MATCH_CNTMETRIC_BYTES");
    }
}
