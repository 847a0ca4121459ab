//! Tenant configuration and destination lookup.
//!
//! Both collaborators are read-only from the engine's point of view and never
//! fail: a broken store yields default configuration and a broken directory
//! yields no destinations.

mod directory;
mod file_store;

pub use directory::{FileDirectory, TenantEntry};
pub use file_store::FileTenantStore;

use async_trait::async_trait;

use crate::domain::{Destination, TenantConfig, TenantId};

/// Per-tenant configuration lookup.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Configuration for `tenant_id`, or the defaults when none is stored.
    async fn tenant_config(&self, tenant_id: &str) -> TenantConfig;
}

/// Directory of known tenants and their delivery destinations.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Re-read the underlying directory, if it can change.
    async fn refresh(&self) {}

    /// All known tenants, in directory order.
    async fn tenants(&self) -> Vec<TenantId>;

    /// Destinations of a tenant in directory order. Empty when unknown.
    async fn list_destinations(&self, tenant_id: &str) -> Vec<Destination>;

    /// Permission check: whether the engine may post to `destination`.
    fn can_deliver(&self, destination: &Destination) -> bool {
        destination.can_receive
    }
}
