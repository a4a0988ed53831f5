//! StreamSelector - group id to upstream endpoint

use contracts::{GroupId, UpstreamConfig};

/// Path of the event stream, relative to the server origin
pub const EVENTS_PATH: &str = "/api/v1/events";

/// Maps a group to the endpoint of its event stream.
///
/// Pure; the group id is inserted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSelector {
    base: String,
}

impl StreamSelector {
    /// Selector with an explicit base (empty for same-origin paths)
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// Selector for the configured runtime mode
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.base())
    }

    /// Base prepended to every endpoint
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `<base>/api/v1/events?stream=group<group_id>`
    pub fn endpoint_for(&self, group_id: &GroupId) -> String {
        format!("{}{}?stream=group{}", self.base, EVENTS_PATH, group_id)
    }
}
