//! # Multiplexer
//!
//! Telemetry fan-out service.
//!
//! Responsibilities:
//! - Keep at most one live upstream subscription, shared by every viewer
//! - Translate viewer control commands into connection lifecycle changes
//! - Normalize each upstream batch once
//! - Broadcast it to every attached viewer port without letting a slow or
//!   gone viewer affect the others
//!
//! ## Usage Example
//!
//! ```ignore
//! use multiplexer::MultiplexerBuilder;
//!
//! let (service, handle) = MultiplexerBuilder::new(config).build()?;
//! let task = service.spawn();
//!
//! let mut port = handle.attach().await?;
//! port.connect("7").await?;
//! while let Some(message) = port.recv().await {
//!     // render message
//! }
//! ```

pub mod control;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod normalize;
pub mod port;
pub mod registry;
pub mod selector;
pub mod service;

pub use contracts::{ControlCommand, TelemetryMessage};
pub use control::ControlHandler;
pub use error::MultiplexerError;
pub use lifecycle::{LifecycleManager, LifecycleState, Transition};
pub use metrics::{PortMetrics, PortMetricsSnapshot};
pub use normalize::normalize;
pub use port::{PortHandle, ViewerPort};
pub use registry::{BroadcastReport, PortRegistry};
pub use selector::StreamSelector;
pub use service::{Multiplexer, MultiplexerBuilder, MultiplexerHandle, MultiplexerStats};
