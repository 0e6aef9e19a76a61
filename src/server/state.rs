//! Shared handler state

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::registry::ChannelRegistry;
use crate::stats::ServerStats;

/// State shared by every HTTP handler
#[derive(Clone)]
pub struct AppState {
    /// Channel registry
    pub registry: Arc<ChannelRegistry>,
    /// Session accounting and limit
    pub sessions: Arc<SessionTracker>,
}

impl AppState {
    /// Create handler state over a registry
    pub fn new(registry: Arc<ChannelRegistry>, max_connections: usize) -> Self {
        Self {
            registry,
            sessions: Arc::new(SessionTracker::new(max_connections)),
        }
    }

    /// Snapshot server-wide statistics
    pub async fn stats(&self) -> ServerStats {
        let registry = self.registry.stats().await;

        ServerStats {
            total_sessions: self.sessions.total.load(Ordering::Relaxed),
            active_sessions: self.sessions.active.load(Ordering::Relaxed),
            rejected_sessions: self.sessions.rejected.load(Ordering::Relaxed),
            channels: registry.channel_count as u64,
            members: registry.total_members as u64,
        }
    }
}

/// Counts sessions and enforces the optional connection limit
pub struct SessionTracker {
    semaphore: Option<Arc<Semaphore>>,
    total: AtomicU64,
    active: AtomicU64,
    rejected: AtomicU64,
}

impl SessionTracker {
    /// Create a tracker; `max_connections` of 0 means unlimited
    pub fn new(max_connections: usize) -> Self {
        let semaphore = if max_connections > 0 {
            Some(Arc::new(Semaphore::new(max_connections)))
        } else {
            None
        };

        Self {
            semaphore,
            total: AtomicU64::new(0),
            active: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Reserve a session slot, or `None` if the limit is reached
    pub fn try_acquire(self: &Arc<Self>) -> Option<SessionPermit> {
        let permit = match self.semaphore {
            Some(ref sem) => match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.rejected.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            },
            None => None,
        };

        self.total.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);

        Some(SessionPermit {
            tracker: Arc::clone(self),
            _permit: permit,
        })
    }

    /// Number of sessions holding a slot
    pub fn active(&self) -> u64 {
        self.active.load(Ordering::Relaxed)
    }
}

/// A reserved session slot, released on drop
pub struct SessionPermit {
    tracker: Arc<SessionTracker>,
    _permit: Option<OwnedSemaphorePermit>,
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        self.tracker.active.fetch_sub(1, Ordering::Relaxed);
    }
}
