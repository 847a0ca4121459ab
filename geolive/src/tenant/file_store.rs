//! JSON-file tenant configuration store.
//!
//! One `<tenant_id>.json` object per tenant inside a config directory. The
//! configuration UI writes these files; the engine only reads them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::TenantStore;
use crate::Result;
use crate::domain::TenantConfig;
use crate::utils::fs;

pub struct FileTenantStore {
    dir: PathBuf,
}

impl FileTenantStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `tenant_id`, if the id is safe to use as a
    /// file name.
    fn config_path(&self, tenant_id: &str) -> Option<PathBuf> {
        let valid = !tenant_id.is_empty()
            && tenant_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.dir.join(format!("{tenant_id}.json")))
    }

    /// Persist a tenant configuration.
    ///
    /// Used by the configuration collaborator and by tests; the dispatch path
    /// never writes.
    pub async fn save(&self, tenant_id: &str, config: &TenantConfig) -> Result<()> {
        let path = self
            .config_path(tenant_id)
            .ok_or_else(|| crate::Error::validation(format!("invalid tenant id: {tenant_id:?}")))?;

        fs::ensure_parent_dir_with_op("creating tenant config directory", &path).await?;
        let body = serde_json::to_vec_pretty(&config.to_value())?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| fs::io_error("writing tenant config", &path, e))
    }
}

#[async_trait]
impl TenantStore for FileTenantStore {
    async fn tenant_config(&self, tenant_id: &str) -> TenantConfig {
        let Some(path) = self.config_path(tenant_id) else {
            debug!(tenant_id = %tenant_id, "Tenant id not usable as a file name, using defaults");
            return TenantConfig::default();
        };

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return TenantConfig::default();
            }
            Err(e) => {
                debug!(tenant_id = %tenant_id, path = %path.display(), error = %e, "Could not read tenant config, using defaults");
                return TenantConfig::default();
            }
        };

        match serde_json::from_slice::<serde_json::Value>(&raw) {
            Ok(value) => TenantConfig::from_value(&value),
            Err(e) => {
                debug!(tenant_id = %tenant_id, error = %e, "Invalid tenant config JSON, using defaults");
                TenantConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Color, FeedKind};

    #[tokio::test]
    async fn test_missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTenantStore::new(dir.path());

        assert_eq!(store.tenant_config("123").await, TenantConfig::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTenantStore::new(dir.path().join("config"));

        let config = TenantConfig {
            earthquake_feed_enabled: false,
            primary_color: Color::Hex("#ff8800".into()),
            ..Default::default()
        };
        store.save("guild_1", &config).await.unwrap();

        let loaded = store.tenant_config("guild_1").await;
        assert_eq!(loaded, config);
        assert!(!loaded.feed_enabled(FeedKind::Earthquake));
        assert_eq!(loaded.theme_color(), 0xFF8800);
    }

    #[tokio::test]
    async fn test_invalid_json_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("42.json"), b"{not json").unwrap();
        let store = FileTenantStore::new(dir.path());

        assert_eq!(store.tenant_config("42").await, TenantConfig::default());
    }

    #[tokio::test]
    async fn test_path_traversal_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTenantStore::new(dir.path());

        assert_eq!(store.tenant_config("../etc/passwd").await, TenantConfig::default());
        assert!(store.save("../escape", &TenantConfig::default()).await.is_err());
        assert!(store.save("", &TenantConfig::default()).await.is_err());
    }
}
