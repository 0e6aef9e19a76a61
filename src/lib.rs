//! Password-protected WebSocket channel relay
//!
//! Clients create a channel with a password, other clients join it over a
//! WebSocket, and every message one member sends is relayed verbatim to all
//! other members of the same channel.
//!
//! # Example
//! ```no_run
//! use whisp_relay::{RelayServer, ServerConfig};
//!
//! # async fn example() -> whisp_relay::error::Result<()> {
//! let server = RelayServer::new(ServerConfig::default());
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use registry::{Channel, ChannelId, ChannelRegistry, MemberId, RegistryConfig, RelayFrame};
pub use server::{RelayServer, ServerConfig};
