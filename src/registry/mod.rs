//! Channel registry and per-channel broadcast
//!
//! The registry owns every channel; each channel owns its membership and
//! fans frames out from one member to all the others.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<ChannelRegistry>
//!                  ┌──────────────────────────┐
//!                  │ channels: RwLock<HashMap< │
//!                  │   ChannelId,              │
//!                  │   Arc<Channel {           │
//!                  │     members: Mutex<..>,   │
//!                  │   }>                      │
//!                  │ >>                        │
//!                  └────────────┬─────────────┘
//!                               │
//!        ┌──────────────────────┼──────────────────────┐
//!        ▼                      ▼                      ▼
//!   [Session A]            [Session B]            [Session C]
//!   socket.next()          queue.recv()           queue.recv()
//!        │                      │                      │
//!        └──► channel.broadcast()──► MemberHandle ──► socket
//! ```
//!
//! # Locking
//!
//! Two lock scopes exist: the registry map lock and one lock per channel.
//! The map lock is never held while a channel lock is taken, and a channel
//! lock is never held across socket I/O: broadcasts only enqueue onto each
//! member's bounded queue.

pub mod config;
pub mod entry;
pub mod error;
pub mod frame;
pub mod id;
pub mod member;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{Channel, ChannelStats};
pub use error::RegistryError;
pub use frame::{ChannelId, FrameKind, MemberId, RelayFrame};
pub use id::{IdGenerator, SequentialGenerator, UuidGenerator};
pub use member::{BroadcastReport, DeliveryError, MemberHandle, Membership};
pub use store::{ChannelRegistry, RegistryStats};
