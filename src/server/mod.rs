//! HTTP and WebSocket surface of the relay
//!
//! Maps the create and join requests onto the channel registry and hands
//! upgraded sockets to the session loop.

pub mod config;
pub mod error;
pub mod listener;
pub mod routes;
pub mod socket;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use listener::RelayServer;
pub use routes::{router, CreateChannelRequest, CreateChannelResponse, JoinChannelQuery};
pub use state::{AppState, SessionPermit, SessionTracker};
