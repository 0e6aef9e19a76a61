//! Session state machine
//!
//! Tracks one joined member from the moment it becomes active to close.

use std::time::Instant;

use crate::registry::{ChannelId, MemberId};
use crate::stats::SessionStats;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Joined and relaying
    Active,
    /// Connection ended and member removed
    Closed,
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer closed the connection or the stream ended
    RemoteClosed,
    /// Reading from the connection failed
    ReadError(String),
    /// Writing to the connection failed
    WriteFailed,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::RemoteClosed => write!(f, "remote closed"),
            CloseReason::ReadError(e) => write!(f, "read error: {}", e),
            CloseReason::WriteFailed => write!(f, "write failed"),
        }
    }
}

/// Complete session state
#[derive(Debug)]
pub struct SessionState {
    /// Channel the member belongs to
    pub channel_id: ChannelId,

    /// Member id issued on join
    pub member_id: MemberId,

    /// Current phase
    pub phase: SessionPhase,

    /// Time the session became active
    pub started_at: Instant,

    /// Frames received from the peer
    pub frames_received: u64,

    /// Payload bytes received from the peer
    pub bytes_received: u64,

    /// Close reason, once closed
    pub close_reason: Option<CloseReason>,
}

impl SessionState {
    /// Create an active session state
    pub fn new(channel_id: ChannelId, member_id: MemberId) -> Self {
        Self {
            channel_id,
            member_id,
            phase: SessionPhase::Active,
            started_at: Instant::now(),
            frames_received: 0,
            bytes_received: 0,
            close_reason: None,
        }
    }

    /// Record an inbound frame
    pub fn on_frame(&mut self, size: usize) {
        self.frames_received += 1;
        self.bytes_received += size as u64;
    }

    /// Transition to closed
    ///
    /// Returns false if the session was already closed; the first reason wins.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        if self.phase == SessionPhase::Closed {
            return false;
        }
        self.phase = SessionPhase::Closed;
        self.close_reason = Some(reason);
        true
    }

    /// Check if session is active
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Snapshot statistics
    pub fn stats(&self, frames_sent: u64) -> SessionStats {
        SessionStats {
            frames_received: self.frames_received,
            bytes_received: self.bytes_received,
            frames_sent,
            duration: self.started_at.elapsed(),
        }
    }
}
