//! # Catalog
//!
//! Static lookup data consumed around the multiplexer:
//! - Metric names emitted by the switch and NIC collectors
//! - Chart registry (title, axis label, tick format per metric key)
//! - Dashboard layout per device class
//!
//! # Example
//!
//! ```
//! use catalog::chart_config;
//!
//! let cfg = chart_config("no such metric");
//! assert_eq!(cfg.title, "Unknown chart");
//! ```

mod chart;
mod dashboard;
pub mod metric_names;

pub use chart::{chart_config, tick_format_for, ChartConfig, DEFAULT_TICK_FORMAT, KNOWN_CHART_KEYS};
pub use dashboard::{dashboard_for, ChartSlot, DashboardSection, SectionKind};
