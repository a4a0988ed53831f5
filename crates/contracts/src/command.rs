//! ControlCommand - viewer to multiplexer control protocol

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GroupId;

/// Command sent by a viewer port.
///
/// Wire shape: `{"status": "CONNECT", "groupId": "7"}` or `{"status": "CLOSE"}`.
/// `groupId` is also accepted under the older key `endpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ControlCommand {
    /// Subscribe the shared upstream connection to a group
    #[serde(rename = "CONNECT")]
    Connect {
        #[serde(rename = "groupId", alias = "endpoint")]
        group_id: GroupId,
    },

    /// Tear down the shared upstream connection
    #[serde(rename = "CLOSE")]
    Close,
}

impl ControlCommand {
    /// Create a connect command
    pub fn connect(group_id: impl Into<GroupId>) -> Self {
        Self::Connect {
            group_id: group_id.into(),
        }
    }

    /// Decode a raw viewer message.
    ///
    /// Returns `None` for anything that is not a recognised command
    /// (unknown status, CONNECT without group, non-object payloads).
    pub fn decode(raw: &Value) -> Option<Self> {
        Self::deserialize(raw).ok()
    }

    /// Encode as the raw viewer message
    pub fn to_value(&self) -> Value {
        // Serializing a tagged enum of strings into a Value cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
