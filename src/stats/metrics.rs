//! Statistics and metrics for relay sessions

use std::time::Duration;

use serde::Serialize;

/// Session-level statistics
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Frames received from the peer
    pub frames_received: u64,
    /// Payload bytes received from the peer
    pub bytes_received: u64,
    /// Frames written to the peer
    pub frames_sent: u64,
    /// Session duration
    pub duration: Duration,
}

impl SessionStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Inbound frame rate in frames per second
    pub fn receive_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.frames_received as f64 / secs
        } else {
            0.0
        }
    }
}

/// Server-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerStats {
    /// Sessions ever started
    pub total_sessions: u64,
    /// Sessions currently running
    pub active_sessions: u64,
    /// Joins refused because of the connection limit
    pub rejected_sessions: u64,
    /// Channels in the registry
    pub channels: u64,
    /// Members across all channels
    pub members: u64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }
}
