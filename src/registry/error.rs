//! Registry error types
//!
//! Error types for channel registry operations.

use super::frame::ChannelId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Channel not found
    ChannelNotFound(ChannelId),
    /// Supplied credential does not match the channel's
    InvalidCredential(ChannelId),
}

impl RegistryError {
    /// Check if the error should be reported to a client as unauthorized
    ///
    /// Both variants are authentication failures from the outside; callers
    /// must not reveal which one occurred.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            RegistryError::ChannelNotFound(_) | RegistryError::InvalidCredential(_)
        )
    }

    /// Channel the failed operation targeted
    pub fn channel_id(&self) -> &ChannelId {
        match self {
            RegistryError::ChannelNotFound(id) | RegistryError::InvalidCredential(id) => id,
        }
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::ChannelNotFound(id) => write!(f, "Channel not found: {}", id),
            RegistryError::InvalidCredential(id) => {
                write!(f, "Invalid credential for channel: {}", id)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
