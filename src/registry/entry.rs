//! Channel state
//!
//! This module defines a single broadcast domain: its credential, its
//! membership table and the broadcast algorithm.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::error::RegistryError;
use super::frame::{ChannelId, MemberId, RelayFrame};
use super::id::IdGenerator;
use super::member::{BroadcastReport, MemberHandle, Membership};

/// A password-protected broadcast domain
///
/// Each channel has its own lock, independent of the registry's and of every
/// other channel's. `join`, `leave` and `broadcast` all take it, so membership
/// changes never interleave with a broadcast's recipient snapshot.
pub struct Channel {
    id: ChannelId,
    credential: String,
    members: Mutex<Membership>,
    ids: Arc<dyn IdGenerator>,
    created_at: Instant,
    messages_relayed: AtomicU64,
    deliveries: AtomicU64,
    delivery_failures: AtomicU64,
}

impl Channel {
    /// Create an empty channel
    pub(super) fn new(id: ChannelId, credential: String, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            id,
            credential,
            members: Mutex::new(Membership::new()),
            ids,
            created_at: Instant::now(),
            messages_relayed: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
        }
    }

    /// Channel identifier
    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    /// Compare a credential with the channel's, byte for byte
    pub fn verify_credential(&self, credential: &str) -> bool {
        self.credential.as_bytes() == credential.as_bytes()
    }

    /// Register a connection as a member
    ///
    /// Fails with [`RegistryError::InvalidCredential`] without touching the
    /// membership if the credential does not match.
    pub async fn join(
        &self,
        credential: &str,
        handle: MemberHandle,
    ) -> Result<MemberId, RegistryError> {
        if !self.verify_credential(credential) {
            tracing::debug!(channel = %self.id, "Join rejected: invalid credential");
            return Err(RegistryError::InvalidCredential(self.id.clone()));
        }

        let mut members = self.members.lock().await;
        let member_id = loop {
            let candidate = MemberId::new(self.ids.next_id());
            if members.insert(candidate.clone(), handle.clone()) {
                break candidate;
            }
        };

        tracing::info!(
            channel = %self.id,
            member = %member_id,
            members = members.len(),
            "Member joined"
        );

        Ok(member_id)
    }

    /// Remove a member; removing an absent member is a no-op
    pub async fn leave(&self, member_id: &MemberId) {
        let mut members = self.members.lock().await;

        if members.remove(member_id).is_some() {
            tracing::info!(
                channel = %self.id,
                member = %member_id,
                members = members.len(),
                "Member left"
            );
        }
    }

    /// Send a frame to every current member except the sender
    ///
    /// Delivery is best effort: a member whose queue is full or closed is
    /// logged and skipped, and stays registered until it leaves.
    pub async fn broadcast(&self, sender: &MemberId, frame: RelayFrame) -> BroadcastReport {
        let members = self.members.lock().await;
        let mut report = BroadcastReport::default();

        for (member_id, handle) in members.others(sender) {
            match handle.deliver(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        channel = %self.id,
                        sender = %sender,
                        member = %member_id,
                        error = %e,
                        "Failed to deliver frame"
                    );
                }
            }
        }
        drop(members);

        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
        self.deliveries
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.delivery_failures
            .fetch_add(report.failed as u64, Ordering::Relaxed);

        tracing::trace!(
            channel = %self.id,
            sender = %sender,
            bytes = frame.len(),
            delivered = report.delivered,
            failed = report.failed,
            "Frame relayed"
        );

        report
    }

    /// Number of current members
    pub async fn member_count(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Check if a member is currently registered
    pub async fn contains(&self, member_id: &MemberId) -> bool {
        self.members.lock().await.contains(member_id)
    }

    /// Get channel statistics
    pub async fn stats(&self) -> ChannelStats {
        ChannelStats {
            member_count: self.member_count().await,
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            age: self.created_at.elapsed(),
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Statistics for a channel
#[derive(Debug, Clone)]
pub struct ChannelStats {
    /// Number of current members
    pub member_count: usize,
    /// Frames broadcast on this channel
    pub messages_relayed: u64,
    /// Successful per-member deliveries
    pub deliveries: u64,
    /// Failed per-member deliveries
    pub delivery_failures: u64,
    /// Time since the channel was created
    pub age: Duration,
}
