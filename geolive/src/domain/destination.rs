//! Delivery destinations.

use serde::{Deserialize, Serialize};

/// A deliverable target belonging to a tenant, e.g. one channel.
///
/// Destinations are recomputed from the directory on every cycle and never
/// persisted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Webhook endpoint used for delivery.
    #[serde(default)]
    pub webhook_url: String,
    /// Result of the directory's permission check.
    #[serde(default = "default_true", alias = "can_send")]
    pub can_receive: bool,
}

impl Destination {
    pub fn new(id: impl Into<String>, webhook_url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            webhook_url: webhook_url.into(),
            can_receive: true,
        }
    }

    pub fn with_permission(mut self, can_receive: bool) -> Self {
        self.can_receive = can_receive;
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

fn default_true() -> bool {
    true
}
