//! Identifier generation
//!
//! Channel and member identifiers come from an [`IdGenerator`] injected into
//! the registry. The default produces random UUIDv4 strings.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of globally-unique opaque identifiers
pub trait IdGenerator: Send + Sync + 'static {
    /// Produce a fresh identifier, never returned before
    fn next_id(&self) -> String;
}

/// Random UUIDv4 identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Monotonic identifiers with a fixed prefix (`"<prefix>-1"`, `"<prefix>-2"`, ...)
///
/// Predictable ids are handy in tests and logs; they must not be used where
/// ids double as secrets.
#[derive(Debug)]
pub struct SequentialGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialGenerator {
    /// Create a generator starting at 1
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}
