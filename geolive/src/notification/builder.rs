//! Notification payload assembly.

use chrono::{DateTime, Utc};

use super::render::{ATTACHMENT_SCHEME, Artifact};
use crate::domain::{AlertEvent, FeedKind, TenantConfig};

const SEPARATOR: &str = "────────────────────────";

/// One name/value field of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            inline,
        }
    }
}

/// Outbound message built for one (tenant, event) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPayload {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub thumbnail_url: Option<String>,
    pub image_url: Option<String>,
    pub url: Option<String>,
    pub footer: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub attachment: Option<Artifact>,
}

/// `http://` or `https://` URL.
pub fn is_valid_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// URL usable as an image: `http(s)` or a reference to an attached file.
pub fn is_valid_image_url(url: &str) -> bool {
    is_valid_http(url) || url.starts_with(ATTACHMENT_SCHEME)
}

/// Format a number the way feeds print them: whole values keep one decimal.
pub(crate) fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Builds notification payloads for one feed kind.
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    kind: FeedKind,
    default_icon_url: Option<String>,
}

impl NotificationBuilder {
    /// `default_icon_url` is used when a tenant has no icon of its own.
    pub fn new(kind: FeedKind, default_icon_url: Option<String>) -> Self {
        Self {
            kind,
            default_icon_url,
        }
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn build(
        &self,
        event: &AlertEvent,
        config: &TenantConfig,
        artifact: Option<Artifact>,
    ) -> NotificationPayload {
        let depth = event
            .depth
            .map_or_else(|| "Unknown".to_string(), |d| format!("{} km", format_decimal(d)));

        let mut fields = vec![
            EmbedField::new("📍 Location", event.place.clone(), false),
            EmbedField::new("🌡️ Magnitude", format_decimal(event.magnitude), true),
            EmbedField::new("📊 Depth", depth, true),
            EmbedField::new("🌐 Latitude", format_decimal(event.latitude), true),
            EmbedField::new("🌍 Longitude", format_decimal(event.longitude), true),
        ];

        // The attached map wins over the tenant banner.
        let image_url = match &artifact {
            Some(artifact) => {
                fields.push(EmbedField::new(
                    SEPARATOR,
                    format!("{} Position Map\n", self.kind.label()),
                    false,
                ));
                Some(artifact.attachment_ref())
            }
            None => config
                .banner_url
                .as_deref()
                .filter(|u| is_valid_image_url(u))
                .map(str::to_string),
        };

        let thumbnail_url = config
            .icon_url
            .as_deref()
            .or(self.default_icon_url.as_deref())
            .filter(|u| is_valid_http(u))
            .map(str::to_string);

        NotificationPayload {
            title: format!("🌐 {}", self.kind.alert_title()),
            color: config.theme_color(),
            fields,
            thumbnail_url,
            image_url,
            url: event.source_url.clone().filter(|u| is_valid_http(u)),
            footer: self.kind.attribution().to_string(),
            timestamp: event.occurred_at,
            attachment: artifact,
        }
    }
}
