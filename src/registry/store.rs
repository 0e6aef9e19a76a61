//! Channel registry implementation
//!
//! The process-wide map from channel id to channel. Constructed once at
//! startup and shared by `Arc` with every request handler.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::config::RegistryConfig;
use super::entry::Channel;
use super::error::RegistryError;
use super::frame::ChannelId;
use super::id::{IdGenerator, UuidGenerator};

/// Central registry for all channels
///
/// The map lock only guards the id to channel mapping. Lookups clone the
/// channel's `Arc` and release the map lock before any channel lock is taken.
/// Channels are never removed.
pub struct ChannelRegistry {
    /// Map of channel id to channel
    channels: RwLock<HashMap<ChannelId, Arc<Channel>>>,

    /// Source of channel and member ids
    ids: Arc<dyn IdGenerator>,

    /// Configuration
    config: RegistryConfig,
}

impl ChannelRegistry {
    /// Create a new registry with default configuration and UUID ids
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self::with_id_generator(config, Arc::new(UuidGenerator))
    }

    /// Create a new registry with a custom id source
    pub fn with_id_generator(config: RegistryConfig, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            ids,
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create a channel protected by `credential`
    ///
    /// Any credential is accepted, including the empty string.
    pub async fn create_channel(&self, credential: impl Into<String>) -> ChannelId {
        let mut channels = self.channels.write().await;

        let id = loop {
            let candidate = ChannelId::new(self.ids.next_id());
            if !channels.contains_key(&candidate) {
                break candidate;
            }
        };

        let channel = Channel::new(id.clone(), credential.into(), Arc::clone(&self.ids));
        channels.insert(id.clone(), Arc::new(channel));

        tracing::info!(channel = %id, channels = channels.len(), "Channel created");

        id
    }

    /// Look up a channel by id
    pub async fn lookup(&self, id: &ChannelId) -> Result<Arc<Channel>, RegistryError> {
        self.channels
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::ChannelNotFound(id.clone()))
    }

    /// Look up a channel and check a credential against it
    pub async fn authorize(
        &self,
        id: &ChannelId,
        credential: &str,
    ) -> Result<Arc<Channel>, RegistryError> {
        let channel = self.lookup(id).await?;

        if channel.verify_credential(credential) {
            Ok(channel)
        } else {
            Err(RegistryError::InvalidCredential(id.clone()))
        }
    }

    /// Get total number of channels
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Get registry-wide statistics
    pub async fn stats(&self) -> RegistryStats {
        // Snapshot first so no channel lock is taken under the map lock.
        let channels: Vec<Arc<Channel>> = self.channels.read().await.values().cloned().collect();

        let mut total_members = 0;
        for channel in &channels {
            total_members += channel.member_count().await;
        }

        RegistryStats {
            channel_count: channels.len(),
            total_members,
        }
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry-wide statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of channels, including empty ones
    pub channel_count: usize,
    /// Members across all channels
    pub total_members: usize,
}
