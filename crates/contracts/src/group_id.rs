//! GroupId - Cheap-to-clone stream group identifier
//!
//! Uses Arc<str> internally; accepted from viewers either as a JSON string or
//! as a JSON number, and carried verbatim into the upstream endpoint.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Logical telemetry group selecting which device stream to subscribe to.
///
/// The value is opaque: no normalisation or validation is applied, so a
/// malformed identifier ends up verbatim in the endpoint URL.
///
/// # Examples
/// ```
/// use contracts::GroupId;
///
/// let id: GroupId = "7".into();
/// let from_number: GroupId = serde_json::from_str("7").unwrap();
/// assert_eq!(id, from_number);
/// assert_eq!(id.as_str(), "7");
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupId(Arc<str>);

impl GroupId {
    /// Create a new GroupId from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for GroupId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for GroupId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for GroupId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<u32> for GroupId {
    fn from(n: u32) -> Self {
        Self::from(n.to_string())
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({:?})", self.0)
    }
}

impl PartialEq<str> for GroupId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for GroupId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for GroupId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

struct GroupIdVisitor;

impl Visitor<'_> for GroupIdVisitor {
    type Value = GroupId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a group id as string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<GroupId, E> {
        Ok(GroupId::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<GroupId, E> {
        Ok(GroupId::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<GroupId, E> {
        Ok(GroupId::from(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<GroupId, E> {
        Ok(GroupId::from(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for GroupId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(GroupIdVisitor)
    }
}
