//! Delivery of built notifications.
//!
//! The dispatcher makes exactly one delivery attempt per call, bounded by a
//! timeout. It never retries and never falls back to another destination;
//! a failed tenant simply waits for the next cycle.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::builder::NotificationPayload;
use super::channels::{NotificationChannel, SendError};
use crate::domain::Destination;

/// Default per-dispatch timeout.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Dispatcher {
    channel: Arc<dyn NotificationChannel>,
    send_timeout: Duration,
}

impl Dispatcher {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self::with_timeout(channel, DEFAULT_SEND_TIMEOUT)
    }

    pub fn with_timeout(channel: Arc<dyn NotificationChannel>, send_timeout: Duration) -> Self {
        Self {
            channel,
            send_timeout,
        }
    }

    /// Attempt one delivery of `payload` to `destination`.
    pub async fn dispatch(
        &self,
        tenant_id: &str,
        destination: &Destination,
        payload: &NotificationPayload,
    ) -> Result<(), SendError> {
        let attempt = self.channel.send(destination, payload);
        match tokio::time::timeout(self.send_timeout, attempt).await {
            Ok(Ok(())) => {
                debug!(
                    tenant_id = %tenant_id,
                    destination = %destination.display_name(),
                    channel = self.channel.channel_type(),
                    "Notification delivered"
                );
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SendError::Timeout(self.send_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SlowChannel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NotificationChannel for SlowChannel {
        fn channel_type(&self) -> &'static str {
            "slow"
        }

        async fn send(&self, _: &Destination, _: &NotificationPayload) -> Result<(), SendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    struct DenyingChannel;

    #[async_trait]
    impl NotificationChannel for DenyingChannel {
        fn channel_type(&self) -> &'static str {
            "deny"
        }

        async fn send(&self, _: &Destination, _: &NotificationPayload) -> Result<(), SendError> {
            Err(SendError::PermissionDenied("missing access".into()))
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload {
            title: "t".into(),
            color: 0,
            fields: Vec::new(),
            thumbnail_url: None,
            image_url: None,
            url: None,
            footer: String::new(),
            timestamp: None,
            attachment: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_times_out_once() {
        let channel = Arc::new(SlowChannel {
            calls: AtomicUsize::new(0),
        });
        let dispatcher = Dispatcher::with_timeout(channel.clone(), Duration::from_secs(5));

        let result = dispatcher
            .dispatch("t1", &Destination::new("d", "https://x"), &payload())
            .await;

        assert!(matches!(result, Err(SendError::Timeout(d)) if d == Duration::from_secs(5)));
        assert_eq!(channel.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_passes_through_classification() {
        let dispatcher = Dispatcher::new(Arc::new(DenyingChannel));
        let result = dispatcher
            .dispatch("t1", &Destination::new("d", "https://x"), &payload())
            .await;

        assert!(result.unwrap_err().is_permission_denied());
    }
}
