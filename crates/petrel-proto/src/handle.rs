//! Identity newtypes shared across the protocol.
//!
//! Plain strings and integers are easy to transpose; a retraction that
//! swaps its target guid for a sender handle should not compile. These
//! wrappers carry no validation beyond non-emptiness of intent: a handle is
//! whatever the origin pod says it is, and a guid is opaque.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A federation-wide address identifying a principal's origin pod and
/// local identity, e.g. `alice@pod.example`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Create a handle from its string form.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Handle {
    fn from(handle: &str) -> Self {
        Self::new(handle)
    }
}

/// Globally unique identifier of a federated object.
///
/// Guids are minted by the object's origin pod and never reused; they are
/// the only cross-pod way to refer to an object (e.g. in a retraction).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(String);

impl Guid {
    /// Create a guid from its string form.
    pub fn new(guid: impl Into<String>) -> Self {
        Self(guid.into())
    }

    /// The guid as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Guid {
    fn from(guid: &str) -> Self {
        Self::new(guid)
    }
}

/// Identifier of a principal local to this pod.
///
/// Only ever meaningful on the pod that minted it; never sent on the wire
/// except inside locally-queued delivery work.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct PrincipalId(pub u64);

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_roundtrips_through_display() {
        let handle = Handle::new("alice@pod.example");
        assert_eq!(handle.to_string(), "alice@pod.example");
        assert_eq!(handle.as_str(), "alice@pod.example");
    }

    #[test]
    fn guid_equality_is_by_value() {
        assert_eq!(Guid::new("g1"), Guid::from("g1"));
        assert_ne!(Guid::new("g1"), Guid::new("g2"));
    }
}
