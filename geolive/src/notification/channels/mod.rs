//! Notification channels.
//!
//! A channel knows how to put a built payload in front of a destination:
//! - Discord webhooks

mod discord;

pub use discord::{DiscordChannel, DiscordConfig};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::builder::NotificationPayload;
use crate::domain::Destination;

/// Classified delivery failure.
#[derive(Debug, Error)]
pub enum SendError {
    /// The destination stopped accepting messages from us.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("transient delivery error: {0}")]
    Transient(String),
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
}

impl SendError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Deliver `payload` to `destination`.
    async fn send(
        &self,
        destination: &Destination,
        payload: &NotificationPayload,
    ) -> Result<(), SendError>;
}
