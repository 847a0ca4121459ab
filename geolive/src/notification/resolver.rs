//! Destination resolution.
//!
//! For each tenant: check the feed toggle, then take the first destination
//! (in directory order) that passes the permission check. Resolution is
//! read-only and never fails; every problem collapses into "no destination".

use std::sync::Arc;

use tracing::debug;

use crate::domain::{Destination, FeedKind, TenantConfig};
use crate::tenant::{TenantDirectory, TenantStore};

/// Result of resolving a tenant.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The tenant turned this feed off.
    Disabled,
    /// No destination passed the permission check.
    NoDestination,
    /// Deliver to `destination`, themed with `config`.
    Resolved {
        config: TenantConfig,
        destination: Destination,
    },
}

/// First candidate satisfying `can_deliver`, in candidate order.
pub fn select_first_viable<'a, F>(candidates: &'a [Destination], can_deliver: F) -> Option<&'a Destination>
where
    F: Fn(&Destination) -> bool,
{
    candidates.iter().find(|d| can_deliver(d))
}

pub struct DestinationResolver {
    kind: FeedKind,
    store: Arc<dyn TenantStore>,
    directory: Arc<dyn TenantDirectory>,
}

impl DestinationResolver {
    pub fn new(
        kind: FeedKind,
        store: Arc<dyn TenantStore>,
        directory: Arc<dyn TenantDirectory>,
    ) -> Self {
        Self {
            kind,
            store,
            directory,
        }
    }

    pub async fn resolve(&self, tenant_id: &str) -> Resolution {
        let config = self.store.tenant_config(tenant_id).await;
        if !config.feed_enabled(self.kind) {
            debug!(tenant_id = %tenant_id, feed = %self.kind, "Feed disabled for tenant");
            return Resolution::Disabled;
        }

        let candidates = self.directory.list_destinations(tenant_id).await;
        match select_first_viable(&candidates, |d| self.directory.can_deliver(d)) {
            Some(destination) => Resolution::Resolved {
                destination: destination.clone(),
                config,
            },
            None => {
                debug!(
                    tenant_id = %tenant_id,
                    candidates = candidates.len(),
                    "No deliverable destination for tenant"
                );
                Resolution::NoDestination
            }
        }
    }
}
