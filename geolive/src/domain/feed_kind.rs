//! Feed categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A category of recurring notification with its own per-tenant toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    #[default]
    Earthquake,
    Weather,
    Iss,
}

impl FeedKind {
    pub const ALL: [FeedKind; 3] = [Self::Earthquake, Self::Weather, Self::Iss];

    /// Tenant configuration key holding this feed's toggle.
    pub fn toggle_key(&self) -> &'static str {
        match self {
            Self::Earthquake => "earthquake_feed_enabled",
            Self::Weather => "weather_feed_enabled",
            Self::Iss => "iss_feed_enabled",
        }
    }

    /// Whether tenants without a stored toggle receive this feed.
    pub fn enabled_by_default(&self) -> bool {
        match self {
            Self::Earthquake | Self::Weather => true,
            Self::Iss => false,
        }
    }

    /// Short human label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Earthquake => "Earthquake",
            Self::Weather => "Weather",
            Self::Iss => "ISS",
        }
    }

    pub fn alert_title(&self) -> &'static str {
        match self {
            Self::Earthquake => "GeoLive Earthquake Alert",
            Self::Weather => "GeoLive Weather Alert",
            Self::Iss => "GeoLive ISS Alert",
        }
    }

    pub fn attribution(&self) -> &'static str {
        match self {
            Self::Earthquake => "Data source: USGS Earthquake Hazards Program",
            Self::Weather => "Data source: WeatherAPI",
            Self::Iss => "Data source: Open Notify",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earthquake => "earthquake",
            Self::Weather => "weather",
            Self::Iss => "iss",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earthquake" | "quake" | "seismic" => Ok(Self::Earthquake),
            "weather" => Ok(Self::Weather),
            "iss" | "orbital" => Ok(Self::Iss),
            other => Err(crate::Error::config(format!("unknown feed kind: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_kind_parse() {
        assert_eq!("earthquake".parse::<FeedKind>().unwrap(), FeedKind::Earthquake);
        assert_eq!(" Weather ".parse::<FeedKind>().unwrap(), FeedKind::Weather);
        assert_eq!("orbital".parse::<FeedKind>().unwrap(), FeedKind::Iss);
        assert!("tides".parse::<FeedKind>().is_err());
    }

    #[test]
    fn test_feed_kind_defaults() {
        assert!(FeedKind::Earthquake.enabled_by_default());
        assert!(FeedKind::Weather.enabled_by_default());
        assert!(!FeedKind::Iss.enabled_by_default());
        assert_eq!(FeedKind::Iss.toggle_key(), "iss_feed_enabled");
    }
}
