//! Per-tenant configuration.
//!
//! Stored configuration is untrusted JSON written by the configuration UI.
//! Every field is read on its own so a malformed value degrades only that
//! field to its default; reading a configuration never fails.

use serde_json::{Map, Value, json};

use super::FeedKind;

/// Theme color used when a tenant has none or it cannot be parsed.
pub const DEFAULT_COLOR: u32 = 0x00AEEF;

/// Default poll interval stored for new tenants, in hours.
pub const DEFAULT_POLL_INTERVAL_HOURS: u32 = 4;

/// Tenant identifier (e.g. a guild id).
pub type TenantId = String;

/// A stored theme color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Color {
    /// Hex string, with or without a leading `#`.
    Hex(String),
    /// Raw integer color.
    Numeric(u32),
    Unset,
}

impl Color {
    /// Read a color from an arbitrary JSON value.
    ///
    /// Strings are kept as [`Color::Hex`] and parsed on resolve. Integers
    /// must fit in a `u32`: negative, fractional or larger numbers read as
    /// [`Color::Unset`], so the tenant gets [`DEFAULT_COLOR`].
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self::Hex(s.clone()),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map_or(Self::Unset, Self::Numeric),
            _ => Self::Unset,
        }
    }

    /// Resolve to an integer color, falling back to [`DEFAULT_COLOR`].
    pub fn resolve(&self) -> u32 {
        match self {
            Self::Numeric(value) => *value,
            Self::Hex(raw) => {
                let cleaned = raw.trim();
                let cleaned = cleaned.strip_prefix('#').unwrap_or(cleaned);
                u32::from_str_radix(cleaned, 16).unwrap_or(DEFAULT_COLOR)
            }
            Self::Unset => DEFAULT_COLOR,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Hex(s) => Value::String(s.clone()),
            Self::Numeric(n) => json!(n),
            Self::Unset => Value::Null,
        }
    }
}

/// Resolved configuration for one tenant.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantConfig {
    pub earthquake_feed_enabled: bool,
    pub weather_feed_enabled: bool,
    pub iss_feed_enabled: bool,
    pub poll_interval_hours: u32,
    pub primary_color: Color,
    pub icon_url: Option<String>,
    pub banner_url: Option<String>,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            earthquake_feed_enabled: FeedKind::Earthquake.enabled_by_default(),
            weather_feed_enabled: FeedKind::Weather.enabled_by_default(),
            iss_feed_enabled: FeedKind::Iss.enabled_by_default(),
            poll_interval_hours: DEFAULT_POLL_INTERVAL_HOURS,
            primary_color: Color::Hex("#00AEEF".to_string()),
            icon_url: None,
            banner_url: None,
        }
    }
}

impl TenantConfig {
    /// Build a configuration from stored JSON, field by field.
    ///
    /// Anything other than an object yields the defaults.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let defaults = Self::default();
        let toggle = |kind: FeedKind| {
            read_bool(obj, kind.toggle_key()).unwrap_or_else(|| kind.enabled_by_default())
        };

        Self {
            earthquake_feed_enabled: toggle(FeedKind::Earthquake),
            weather_feed_enabled: toggle(FeedKind::Weather),
            iss_feed_enabled: toggle(FeedKind::Iss),
            poll_interval_hours: obj
                .get("interval")
                .and_then(Value::as_u64)
                .filter(|v| *v > 0)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.poll_interval_hours),
            primary_color: match obj.get("primary_color") {
                None => defaults.primary_color,
                value => Color::from_value(value),
            },
            icon_url: read_url(obj, "icon_url"),
            banner_url: read_url(obj, "banner_url"),
        }
    }

    /// Serialize back to the stored JSON layout.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        for kind in FeedKind::ALL {
            obj.insert(kind.toggle_key().to_string(), Value::Bool(self.feed_enabled(kind)));
        }
        obj.insert("interval".to_string(), json!(self.poll_interval_hours));
        obj.insert("primary_color".to_string(), self.primary_color.to_value());
        obj.insert("icon_url".to_string(), json!(self.icon_url.clone().unwrap_or_default()));
        obj.insert("banner_url".to_string(), json!(self.banner_url.clone().unwrap_or_default()));
        Value::Object(obj)
    }

    /// Whether the tenant wants notifications for `kind`.
    pub fn feed_enabled(&self, kind: FeedKind) -> bool {
        match kind {
            FeedKind::Earthquake => self.earthquake_feed_enabled,
            FeedKind::Weather => self.weather_feed_enabled,
            FeedKind::Iss => self.iss_feed_enabled,
        }
    }

    pub fn theme_color(&self) -> u32 {
        self.primary_color.resolve()
    }
}

fn read_bool(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

fn read_url(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
