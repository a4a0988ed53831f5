//! Dashboard layout per device class
//!
//! Only the rendering side reads this; the multiplexer never does.

use contracts::DeviceClass;
use serde::Serialize;

use crate::metric_names::*;

/// One position in a static chart list: a single chart or a group of charts
/// drawn side by side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChartSlot {
    Single(&'static str),
    Group(&'static [&'static str]),
}

/// How a section obtains its charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SectionKind {
    /// Fixed, ordered chart list
    Static { charts: &'static [ChartSlot] },
    /// Charts discovered at runtime from a named metric group
    List {
        #[serde(rename = "groupName")]
        group_name: &'static str,
    },
}

/// One dashboard section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSection {
    pub key: &'static str,
    pub title: &'static str,
    #[serde(flatten)]
    pub kind: SectionKind,
    pub disable_session_filter: bool,
}

const DEFAULT_PROBE_CHART_ORDER: &[ChartSlot] = &[
    ChartSlot::Group(&[PROBE_INGRESS_MATCH_CNT_BYTE, PROBE_INGRESS_MATCH_CNT_PKT]),
    ChartSlot::Group(&[PROBE_INGRESS_START_HDR_BYTE, PROBE_INGRESS_END_HDR_BYTE]),
    ChartSlot::Group(&[PROBE_EGRESS_START_CNT_BYTE, PROBE_EGRESS_START_CNT_PKTS]),
    ChartSlot::Single(PROBE_EGRESS_END_CNT_BYTE),
    ChartSlot::Single(PROBE_INGRESS_JITTER),
];

const TM_CHART_ORDER: &[ChartSlot] = &[
    ChartSlot::Group(&[PROBE_TM_INGRESS_DROP_PKT, PROBE_TM_EGRESS_DROP_PKT]),
    ChartSlot::Group(&[PROBE_TM_INGRESS_USAGE_CELLS, PROBE_TM_EGRESS_USAGE_CELLS]),
    ChartSlot::Single(PROBE_TM_PIPE_TOTAL_BUF_DROP),
    ChartSlot::Group(&[PROBE_TM_PIPE_IG_FULL_BUF, PROBE_TM_PIPE_EG_DROP_PKT]),
];

const ETHTOOL_CHART_ORDER: &[ChartSlot] = &[
    ChartSlot::Group(&[PROBE_ETHTOOL_RX_DISCARD, PROBE_ETHTOOL_TX_DISCARD]),
    ChartSlot::Group(&[PROBE_ETHTOOL_RX_PAUSE, PROBE_ETHTOOL_TX_PAUSE]),
    ChartSlot::Single(PROBE_ETHTOOL_RX_OOB),
];

const NEO_CHART_ORDER: &[ChartSlot] = &[
    ChartSlot::Group(&[PROBE_NEO_TX_BW, PROBE_NEO_RX_BW]),
    ChartSlot::Group(&[PROBE_NEO_TX_PKT, PROBE_NEO_RX_PKT]),
    ChartSlot::Group(&[PROBE_NEO_PCI_OUT_BW, PROBE_NEO_PCI_IN_BW]),
    ChartSlot::Single(PROBE_NEO_PCI_BP),
    ChartSlot::Group(&[PROBE_NEO_RX_FULL_0, PROBE_NEO_RX_FULL_1]),
    ChartSlot::Group(&[PROBE_NEO_TPT_MTT_L0_MISS, PROBE_NEO_TPT_MTT_L1_MISS]),
    ChartSlot::Group(&[PROBE_NEO_TPT_MPT_L0_MISS, PROBE_NEO_TPT_MPT_L1_MISS]),
    ChartSlot::Group(&[PROBE_NEO_ICM_MISS, PROBE_NEO_WQE_MISS]),
];

const TOFINO_SECTIONS: &[DashboardSection] = &[
    DashboardSection {
        key: "MAIN_CHARTS",
        title: "Default Probes",
        kind: SectionKind::Static {
            charts: DEFAULT_PROBE_CHART_ORDER,
        },
        disable_session_filter: false,
    },
    DashboardSection {
        key: "APP_REG_CHARTS",
        title: "Application owned registers",
        kind: SectionKind::List {
            group_name: "appRegister",
        },
        disable_session_filter: true,
    },
    DashboardSection {
        key: "EXTRA_PROBES_CHARTS",
        title: "Extra probes",
        kind: SectionKind::List {
            group_name: "extraProbes",
        },
        disable_session_filter: false,
    },
    DashboardSection {
        key: "TM_CHARTS",
        title: "Traffic Manager",
        kind: SectionKind::Static {
            charts: TM_CHART_ORDER,
        },
        disable_session_filter: true,
    },
];

const NIC_SECTIONS: &[DashboardSection] = &[
    DashboardSection {
        key: "ETHTOOL_CHARTS",
        title: "Ethtool",
        kind: SectionKind::Static {
            charts: ETHTOOL_CHART_ORDER,
        },
        disable_session_filter: true,
    },
    DashboardSection {
        key: "NEOHOST_CHARTS",
        title: "NEO-Host",
        kind: SectionKind::Static {
            charts: NEO_CHART_ORDER,
        },
        disable_session_filter: true,
    },
];

/// Ordered dashboard sections for a device class
pub fn dashboard_for(class: DeviceClass) -> &'static [DashboardSection] {
    match class {
        DeviceClass::Tofino => TOFINO_SECTIONS,
        DeviceClass::Nic => NIC_SECTIONS,
    }
}

impl ChartSlot {
    /// Chart keys in this slot
    pub fn keys(&self) -> Vec<&'static str> {
        match self {
            ChartSlot::Single(key) => vec![*key],
            ChartSlot::Group(keys) => keys.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chart_config, ChartConfig};

    #[test]
    fn test_section_order() {
        let keys: Vec<_> = dashboard_for(DeviceClass::Tofino)
            .iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(
            keys,
            ["MAIN_CHARTS", "APP_REG_CHARTS", "EXTRA_PROBES_CHARTS", "TM_CHARTS"]
        );

        let nic: Vec<_> = dashboard_for(DeviceClass::Nic).iter().map(|s| s.key).collect();
        assert_eq!(nic, ["ETHTOOL_CHARTS", "NEOHOST_CHARTS"]);
    }

    #[test]
    fn test_static_charts_are_registered() {
        for class in DeviceClass::all() {
            for section in dashboard_for(class) {
                if let SectionKind::Static { charts } = section.kind {
                    for key in charts.iter().flat_map(ChartSlot::keys) {
                        assert_ne!(chart_config(key), ChartConfig::FALLBACK, "key {key}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_section_serialization() {
        let value = serde_json::to_value(dashboard_for(DeviceClass::Tofino)[1]).unwrap();
        assert_eq!(value["type"], "list");
        assert_eq!(value["groupName"], "appRegister");
        assert_eq!(value["disableSessionFilter"], true);

        let value = serde_json::to_value(dashboard_for(DeviceClass::Tofino)[0]).unwrap();
        assert_eq!(value["type"], "static");
        assert!(value["charts"][0].is_array());
        assert!(value["charts"][3].is_string());
    }
}
