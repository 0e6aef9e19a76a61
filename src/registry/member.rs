//! Member handles and the membership table
//!
//! A member is registered with a [`MemberHandle`], the sending half of a
//! bounded queue. The member's own writer task drains the receiving half onto
//! its connection, so a broadcast only ever enqueues and never waits on a
//! slow peer's socket.

use std::collections::hash_map;
use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::frame::{MemberId, RelayFrame};

/// Error delivering a frame to a single member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// Member's outbound queue is full
    QueueFull,
    /// Member's writer has gone away
    Disconnected,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::QueueFull => write!(f, "Member queue full"),
            DeliveryError::Disconnected => write!(f, "Member disconnected"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Outbound handle for one member's connection
#[derive(Debug, Clone)]
pub struct MemberHandle {
    tx: mpsc::Sender<RelayFrame>,
}

impl MemberHandle {
    /// Create a handle and the queue receiver its writer task drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RelayFrame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue a frame without waiting
    pub fn deliver(&self, frame: RelayFrame) -> Result<(), DeliveryError> {
        self.tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Disconnected,
        })
    }

    /// Check if the receiving side has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Result of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Members the frame was enqueued for
    pub delivered: usize,
    /// Members the frame could not be enqueued for
    pub failed: usize,
}

impl BroadcastReport {
    /// Number of members the broadcast targeted
    pub fn recipients(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Membership table of a channel
///
/// Not synchronised on its own: the owning [`Channel`](super::Channel) keeps
/// it behind its exclusive lock, so every insert, remove and broadcast
/// snapshot observes a consistent member set.
#[derive(Debug, Default)]
pub struct Membership {
    members: HashMap<MemberId, MemberHandle>,
}

impl Membership {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member, returning false if the id was already present
    pub fn insert(&mut self, id: MemberId, handle: MemberHandle) -> bool {
        match self.members.entry(id) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    /// Remove a member; absent ids are ignored
    pub fn remove(&mut self, id: &MemberId) -> Option<MemberHandle> {
        self.members.remove(id)
    }

    /// Check if a member is registered
    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.contains_key(id)
    }

    /// Number of registered members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate over all members other than `sender`
    pub fn others<'a>(
        &'a self,
        sender: &'a MemberId,
    ) -> impl Iterator<Item = (&'a MemberId, &'a MemberHandle)> + 'a {
        self.members.iter().filter(move |(id, _)| *id != sender)
    }
}
