//! # Contracts
//!
//! Interface contracts shared by every crate of the multiplexer: the telemetry
//! wire model, the viewer control protocol, configuration and errors.
//! Business crates depend on this crate, never the other way round.
//!
//! ## Wire model
//! - Upstream pushes one JSON `TelemetryMessage` per server-sent event
//! - Viewers send `ControlCommand`s and receive normalized `TelemetryMessage`s

mod command;
mod config;
mod error;
mod group_id;
mod ids;
mod telemetry;

pub use command::ControlCommand;
pub use config::*;
pub use error::*;
pub use group_id::GroupId;
pub use ids::{ConnectionId, PortId};
pub use telemetry::*;
