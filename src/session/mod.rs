//! Session management
//!
//! A session is one joined member's connection, from join until the
//! connection ends and the member leaves its channel.

pub mod connection;
pub mod state;

pub use connection::{Session, SessionSummary, WRITER_DRAIN_TIMEOUT};
pub use state::{CloseReason, SessionPhase, SessionState};
