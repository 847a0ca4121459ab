//! File-backed tenant directory.
//!
//! The directory file is a JSON array of tenants, each with an ordered list
//! of destinations:
//!
//! ```json
//! [
//!   {
//!     "id": "1234",
//!     "name": "Example Guild",
//!     "destinations": [
//!       { "id": "55", "name": "alerts", "webhook_url": "https://...", "can_send": true }
//!     ]
//!   }
//! ]
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::TenantDirectory;
use crate::Result;
use crate::domain::{Destination, TenantId};
use crate::utils::fs;

/// One tenant and its destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantEntry {
    pub id: TenantId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub destinations: Vec<Destination>,
}

impl TenantEntry {
    pub fn new(id: impl Into<TenantId>, destinations: Vec<Destination>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            destinations,
        }
    }
}

/// Directory snapshot, optionally backed by a file that is re-read on
/// [`TenantDirectory::refresh`].
pub struct FileDirectory {
    path: Option<PathBuf>,
    entries: RwLock<Vec<TenantEntry>>,
}

impl FileDirectory {
    /// Load the directory from `path`.
    ///
    /// Fails only at startup; later refreshes keep the previous snapshot when
    /// the file becomes unreadable.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path).await?;
        debug!(path = %path.display(), tenants = entries.len(), "Loaded tenant directory");

        Ok(Self {
            path: Some(path),
            entries: RwLock::new(entries),
        })
    }

    /// In-memory directory that never changes.
    pub fn from_entries(entries: Vec<TenantEntry>) -> Self {
        Self {
            path: None,
            entries: RwLock::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

async fn read_entries(path: &Path) -> Result<Vec<TenantEntry>> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| fs::io_error("reading tenant directory", path, e))?;
    Ok(serde_json::from_slice(&raw)?)
}

#[async_trait]
impl TenantDirectory for FileDirectory {
    async fn refresh(&self) {
        let Some(path) = &self.path else {
            return;
        };

        match read_entries(path).await {
            Ok(entries) => *self.entries.write() = entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to refresh tenant directory, keeping previous snapshot");
            }
        }
    }

    async fn tenants(&self) -> Vec<TenantId> {
        self.entries.read().iter().map(|t| t.id.clone()).collect()
    }

    async fn list_destinations(&self, tenant_id: &str) -> Vec<Destination> {
        self.entries
            .read()
            .iter()
            .find(|t| t.id == tenant_id)
            .map(|t| t.destinations.clone())
            .unwrap_or_default()
    }

    fn can_deliver(&self, destination: &Destination) -> bool {
        destination.can_receive && !destination.webhook_url.is_empty()
    }
}
