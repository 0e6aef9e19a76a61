//! Relay server listener
//!
//! Binds the HTTP listener and serves the relay routes.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::error::Result;
use crate::registry::{ChannelRegistry, RegistryConfig};
use crate::server::config::ServerConfig;
use crate::server::routes;
use crate::server::state::AppState;

/// Relay server
pub struct RelayServer {
    config: ServerConfig,
    state: AppState,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry_config(config, RegistryConfig::default())
    }

    /// Create a new server with custom registry configuration
    pub fn with_registry_config(config: ServerConfig, registry_config: RegistryConfig) -> Self {
        Self::with_registry(config, Arc::new(ChannelRegistry::with_config(registry_config)))
    }

    /// Create a new server over an existing registry
    pub fn with_registry(config: ServerConfig, registry: Arc<ChannelRegistry>) -> Self {
        let state = AppState::new(registry, config.max_connections);
        Self { config, state }
    }

    /// Get a reference to the channel registry
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.state.registry
    }

    /// Get the handler state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the listener fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// Sessions that are already upgraded keep running until their
    /// connections close.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Relay server listening");

        let app = routes::router(self.state.clone());

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        Ok(())
    }
}
