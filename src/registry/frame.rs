//! Relay frame and key types
//!
//! This module defines the identifiers for channels and members, and the
//! frames that are relayed between members of a channel.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Unique identifier for a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a channel id from an opaque string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a member within a channel
///
/// Issued by [`Channel::join`](super::Channel::join) and valid for the life
/// of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberId(String);

impl MemberId {
    /// Create a member id from an opaque string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of relayed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// UTF-8 text payload
    Text,
    /// Arbitrary binary payload
    Binary,
}

/// A frame relayed to the other members of a channel
///
/// Cheap to clone: every recipient shares the same `Bytes` allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayFrame {
    /// Kind of payload, preserved end to end
    pub kind: FrameKind,
    /// Payload, never inspected or modified
    pub data: Bytes,
}

impl RelayFrame {
    /// Create a text frame
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Text,
            data: Bytes::from(text.into()),
        }
    }

    /// Create a binary frame
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Binary,
            data: data.into(),
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload as text, if this is a text frame
    pub fn as_text(&self) -> Option<&str> {
        match self.kind {
            FrameKind::Text => std::str::from_utf8(&self.data).ok(),
            FrameKind::Binary => None,
        }
    }
}
