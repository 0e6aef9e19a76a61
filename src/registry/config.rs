//! Registry configuration

/// Default number of frames queued per member before deliveries are dropped
pub const DEFAULT_MEMBER_QUEUE_CAPACITY: usize = 100;

/// Channel registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Outbound queue capacity per member
    ///
    /// A member whose queue is full misses frames until its writer catches up.
    pub member_queue_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            member_queue_capacity: DEFAULT_MEMBER_QUEUE_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// Set the per-member queue capacity (at least 1)
    pub fn member_queue_capacity(mut self, capacity: usize) -> Self {
        self.member_queue_capacity = capacity.max(1);
        self
    }
}
