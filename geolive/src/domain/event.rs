//! Feed events.
//!
//! An [`Event`] is whatever the feed handed us, with every display field
//! optional. An [`AlertEvent`] is an event that passed selection: the fields
//! needed to render and describe it are guaranteed present.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Place label used when the feed omits one.
pub const UNKNOWN_PLACE: &str = "Unknown";

/// A raw event record fetched from an event source.
///
/// Deserialization is lenient per field: a non-numeric magnitude or
/// coordinate reads as absent instead of rejecting the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default = "unknown_place", deserialize_with = "lenient_place")]
    pub place: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub magnitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub depth: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source_url: Option<String>,
}

impl Event {
    /// Create an event with the given place and no other data.
    pub fn new(place: impl Into<String>) -> Self {
        Self {
            place: place.into(),
            magnitude: None,
            occurred_at: None,
            latitude: None,
            longitude: None,
            depth: None,
            source_url: None,
        }
    }

    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_depth(mut self, depth: f64) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

/// An event that passed selection and can be rendered and announced.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub place: String,
    pub magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub depth: Option<f64>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
}

/// Required display field missing from an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Magnitude,
    Latitude,
    Longitude,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Magnitude => "magnitude",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
        };
        f.write_str(name)
    }
}

impl TryFrom<&Event> for AlertEvent {
    type Error = MissingField;

    fn try_from(event: &Event) -> Result<Self, Self::Error> {
        let latitude = event.latitude.ok_or(MissingField::Latitude)?;
        let longitude = event.longitude.ok_or(MissingField::Longitude)?;
        let magnitude = event.magnitude.ok_or(MissingField::Magnitude)?;

        Ok(Self {
            place: event.place.clone(),
            magnitude,
            latitude,
            longitude,
            depth: event.depth,
            occurred_at: event.occurred_at,
            source_url: event.source_url.clone(),
        })
    }
}

fn unknown_place() -> String {
    UNKNOWN_PLACE.to_string()
}

fn lenient_place<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => s,
        _ => unknown_place(),
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_f64()
        .filter(|v| v.is_finite()))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

/// Accepts RFC 3339 strings or unix epoch milliseconds.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    })
}
