//! Process settings read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::domain::FeedKind;
use crate::domain::tenant::DEFAULT_POLL_INTERVAL_HOURS;
use crate::scheduler::{CycleConfig, SchedulerConfig};
use crate::{Error, Result};

/// Unconfigured `ICON_URL` value; treated as no icon.
pub const PLACEHOLDER_ICON_URL: &str = "YOUR_ICON_URL";

/// Longest accepted cycle interval (one year).
pub const MAX_POLL_INTERVAL_HOURS: u64 = 24 * 365;

/// Immutable settings, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub feed_url: Url,
    pub feed_kind: FeedKind,
    pub tenants_file: PathBuf,
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
    pub poll_interval_hours: u64,
    pub icon_url: Option<String>,
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub send_timeout: Duration,
    pub max_concurrent_tenants: usize,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// Environment variables:
    /// - `GEOLIVE_FEED_URL`: feed endpoint (required, http/https)
    /// - `GEOLIVE_FEED_KIND`: `earthquake`, `weather` or `iss` (default: earthquake)
    /// - `GEOLIVE_TENANTS_FILE`: tenant directory file (default: data/tenants.json)
    /// - `GEOLIVE_CONFIG_DIR`: per-tenant configuration directory (default: data/config)
    /// - `GEOLIVE_LOG_DIR`: log directory (default: logs)
    /// - `AUTO_FEED_HOURS`: cycle interval in hours (default: 4)
    /// - `ICON_URL`: fallback thumbnail URL
    /// - `GEOLIVE_FETCH_TIMEOUT_SECS` (default: 10)
    /// - `GEOLIVE_RENDER_TIMEOUT_SECS` (default: 10)
    /// - `GEOLIVE_SEND_TIMEOUT_SECS` (default: 15)
    /// - `GEOLIVE_MAX_CONCURRENT_TENANTS` (default: 4)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_url = get("GEOLIVE_FEED_URL")
            .ok_or_else(|| Error::config("GEOLIVE_FEED_URL is not set"))?;
        let feed_url = Url::parse(&raw_url)
            .map_err(|e| Error::config(format!("GEOLIVE_FEED_URL is invalid: {e}")))?;
        if !matches!(feed_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "GEOLIVE_FEED_URL must use http or https, got {}",
                feed_url.scheme()
            )));
        }

        let feed_kind = match get("GEOLIVE_FEED_KIND") {
            Some(raw) => FeedKind::from_str(&raw)?,
            None => FeedKind::default(),
        };

        let icon_url = get("ICON_URL").filter(|url| url != PLACEHOLDER_ICON_URL);

        Ok(Self {
            feed_url,
            feed_kind,
            tenants_file: get("GEOLIVE_TENANTS_FILE")
                .unwrap_or_else(|| "data/tenants.json".to_string())
                .into(),
            config_dir: get("GEOLIVE_CONFIG_DIR")
                .unwrap_or_else(|| "data/config".to_string())
                .into(),
            log_dir: get("GEOLIVE_LOG_DIR")
                .unwrap_or_else(|| "logs".to_string())
                .into(),
            poll_interval_hours: bounded(
                "AUTO_FEED_HOURS",
                get("AUTO_FEED_HOURS"),
                u64::from(DEFAULT_POLL_INTERVAL_HOURS),
                MAX_POLL_INTERVAL_HOURS,
            ),
            icon_url,
            fetch_timeout: secs("GEOLIVE_FETCH_TIMEOUT_SECS", get("GEOLIVE_FETCH_TIMEOUT_SECS"), 10),
            render_timeout: secs("GEOLIVE_RENDER_TIMEOUT_SECS", get("GEOLIVE_RENDER_TIMEOUT_SECS"), 10),
            send_timeout: secs("GEOLIVE_SEND_TIMEOUT_SECS", get("GEOLIVE_SEND_TIMEOUT_SECS"), 15),
            max_concurrent_tenants: positive(
                "GEOLIVE_MAX_CONCURRENT_TENANTS",
                get("GEOLIVE_MAX_CONCURRENT_TENANTS"),
                4,
            ),
        })
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::from_hours(self.poll_interval_hours)
    }

    pub fn cycle_config(&self) -> CycleConfig {
        CycleConfig {
            fetch_timeout: self.fetch_timeout,
            render_timeout: self.render_timeout,
            send_timeout: self.send_timeout,
            max_concurrent_tenants: self.max_concurrent_tenants,
            default_icon_url: self.icon_url.clone(),
        }
    }
}

/// Parse a strictly positive number, falling back to `default`.
fn positive<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    parse_setting(key, raw, default, |value| value > T::default())
}

/// Parse a number in `1..=max`, falling back to `default`.
fn bounded(key: &str, raw: Option<String>, default: u64, max: u64) -> u64 {
    parse_setting(key, raw, default, |value| (1..=max).contains(&value))
}

fn parse_setting<T>(key: &str, raw: Option<String>, default: T, accept: impl Fn(T) -> bool) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) if accept(value) => value,
        _ => {
            warn!(key, value = %raw, default = %default, "Invalid setting, using default");
            default
        }
    }
}

fn secs(key: &str, raw: Option<String>, default: u64) -> Duration {
    Duration::from_secs(positive(key, raw, default))
}
