//! One fan-out cycle: Poll → Select → (per tenant) Resolve → Render →
//! Build → Dispatch.
//!
//! Every per-tenant step returns a typed outcome that the tenant loop
//! matches on, so a failing tenant only ever produces its own
//! [`TenantOutcome`]. Only a fetch failure (or an empty/incomplete batch)
//! affects the whole cycle, and then nothing is dispatched at all.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::domain::{AlertEvent, FeedKind, TenantId};
use crate::feed::{EventSource, FetchError, NoEvent, select_event};
use crate::notification::{
    Artifact, AssetRenderer, DestinationResolver, Dispatcher, NotificationBuilder,
    NotificationChannel, RenderError, Resolution, SendError,
};
use crate::tenant::{TenantDirectory, TenantStore};

/// Timeouts and concurrency for a cycle.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub send_timeout: Duration,
    /// Upper bound on tenants processed at the same time.
    pub max_concurrent_tenants: usize,
    /// Thumbnail for tenants without their own icon.
    pub default_icon_url: Option<String>,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            render_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(15),
            max_concurrent_tenants: 4,
            default_icon_url: None,
        }
    }
}

/// External collaborators a cycle talks to.
pub struct Collaborators {
    pub source: Arc<dyn EventSource>,
    pub store: Arc<dyn TenantStore>,
    pub directory: Arc<dyn TenantDirectory>,
    pub renderer: Arc<dyn AssetRenderer>,
    pub channel: Arc<dyn NotificationChannel>,
}

/// What happened to one tenant during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantOutcome {
    Delivered { destination_id: String },
    Disabled,
    NoDestination,
    RenderFailed { reason: String },
    PermissionDenied { destination_id: String, reason: String },
    SendFailed { destination_id: String, reason: String },
}

impl TenantOutcome {
    /// Whether the channel was invoked for this tenant.
    pub fn dispatched(&self) -> bool {
        matches!(
            self,
            Self::Delivered { .. } | Self::PermissionDenied { .. } | Self::SendFailed { .. }
        )
    }
}

/// Why a cycle dispatched nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleSkip {
    FetchFailed(String),
    NoEvent(NoEvent),
}

/// Summary of one cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub event: Option<AlertEvent>,
    pub skipped: Option<CycleSkip>,
    /// Outcomes in directory order.
    pub outcomes: Vec<(TenantId, TenantOutcome)>,
}

impl CycleReport {
    fn skipped(reason: CycleSkip) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }

    /// Number of channel invocations across all tenants.
    pub fn dispatch_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.dispatched()).count()
    }

    pub fn delivered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, TenantOutcome::Delivered { .. }))
            .count()
    }

    pub fn outcome(&self, tenant_id: &str) -> Option<&TenantOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == tenant_id)
            .map(|(_, o)| o)
    }
}

/// Runs cycles for one feed kind.
pub struct FeedCycle {
    kind: FeedKind,
    source: Arc<dyn EventSource>,
    directory: Arc<dyn TenantDirectory>,
    resolver: DestinationResolver,
    renderer: Arc<dyn AssetRenderer>,
    builder: NotificationBuilder,
    dispatcher: Dispatcher,
    config: CycleConfig,
}

impl FeedCycle {
    pub fn new(kind: FeedKind, collaborators: Collaborators, config: CycleConfig) -> Self {
        let Collaborators {
            source,
            store,
            directory,
            renderer,
            channel,
        } = collaborators;

        Self {
            kind,
            resolver: DestinationResolver::new(kind, store, directory.clone()),
            builder: NotificationBuilder::new(kind, config.default_icon_url.clone()),
            dispatcher: Dispatcher::with_timeout(channel, config.send_timeout),
            source,
            directory,
            renderer,
            config,
        }
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    /// Execute one full cycle.
    pub async fn run_once(&self) -> CycleReport {
        let events = match self.fetch().await {
            Ok(events) => events,
            Err(e) => {
                error!(feed = %self.kind, error = %e, "Feed fetch failed, skipping cycle");
                return CycleReport::skipped(CycleSkip::FetchFailed(e.to_string()));
            }
        };

        let event = match select_event(&events) {
            Ok(event) => event,
            Err(reason) => {
                info!(feed = %self.kind, reason = %reason, "Nothing to announce this cycle");
                return CycleReport::skipped(CycleSkip::NoEvent(reason));
            }
        };

        self.directory.refresh().await;
        let tenants = self.directory.tenants().await;
        debug!(feed = %self.kind, tenants = tenants.len(), place = %event.place, "Fanning out event");

        let alert = &event;
        let outcomes = futures::stream::iter(tenants)
            .map(|tenant_id| async move {
                let outcome = self.process_tenant(&tenant_id, alert).await;
                (tenant_id, outcome)
            })
            .buffered(self.config.max_concurrent_tenants.max(1))
            .collect::<Vec<_>>()
            .await;

        CycleReport {
            event: Some(event),
            skipped: None,
            outcomes,
        }
    }

    async fn fetch(&self) -> Result<Vec<crate::domain::Event>, FetchError> {
        let timeout = self.config.fetch_timeout;
        tokio::time::timeout(timeout, self.source.fetch_events(self.kind))
            .await
            .unwrap_or(Err(FetchError::Timeout(timeout)))
    }

    async fn render(&self, event: &AlertEvent) -> Result<Artifact, RenderError> {
        let timeout = self.config.render_timeout;
        tokio::time::timeout(timeout, self.renderer.render(event))
            .await
            .unwrap_or(Err(RenderError::Timeout(timeout)))
    }

    async fn process_tenant(&self, tenant_id: &str, event: &AlertEvent) -> TenantOutcome {
        let (config, destination) = match self.resolver.resolve(tenant_id).await {
            Resolution::Disabled => return TenantOutcome::Disabled,
            Resolution::NoDestination => return TenantOutcome::NoDestination,
            Resolution::Resolved {
                config,
                destination,
            } => (config, destination),
        };

        let artifact = match self.render(event).await {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!(tenant_id = %tenant_id, error = %e, "Artifact render failed, skipping tenant");
                return TenantOutcome::RenderFailed {
                    reason: e.to_string(),
                };
            }
        };

        let payload = self.builder.build(event, &config, Some(artifact));

        match self.dispatcher.dispatch(tenant_id, &destination, &payload).await {
            Ok(()) => TenantOutcome::Delivered {
                destination_id: destination.id,
            },
            Err(SendError::PermissionDenied(reason)) => {
                warn!(
                    tenant_id = %tenant_id,
                    destination = %destination.id,
                    reason = %reason,
                    "Destination refused delivery, skipping tenant this cycle"
                );
                TenantOutcome::PermissionDenied {
                    destination_id: destination.id,
                    reason,
                }
            }
            Err(e) => {
                warn!(
                    tenant_id = %tenant_id,
                    destination = %destination.id,
                    error = %e,
                    "Delivery failed, skipping tenant this cycle"
                );
                TenantOutcome::SendFailed {
                    destination_id: destination.id,
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let report = CycleReport {
            event: None,
            skipped: None,
            outcomes: vec![
                ("a".into(), TenantOutcome::Delivered { destination_id: "1".into() }),
                ("b".into(), TenantOutcome::Disabled),
                (
                    "c".into(),
                    TenantOutcome::SendFailed {
                        destination_id: "2".into(),
                        reason: "boom".into(),
                    },
                ),
                ("d".into(), TenantOutcome::RenderFailed { reason: "x".into() }),
            ],
        };

        assert_eq!(report.dispatch_count(), 2);
        assert_eq!(report.delivered_count(), 1);
        assert_eq!(report.outcome("b"), Some(&TenantOutcome::Disabled));
        assert_eq!(report.outcome("zzz"), None);
    }

    #[test]
    fn test_cycle_config_default() {
        let config = CycleConfig::default();
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.max_concurrent_tenants, 4);
    }
}
