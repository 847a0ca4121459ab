//! Discord webhook notification channel.
//!
//! Posts one embed per notification. When the payload carries an artifact
//! it is uploaded alongside the message as `files[0]` so the embed can
//! reference it through `attachment://`.
//!
//! Rate limits are reported, not waited out: a 429 is classified as
//! [`SendError::RateLimited`] carrying the server's `Retry-After`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{NotificationChannel, SendError};
use crate::domain::Destination;
use crate::notification::builder::NotificationPayload;
use crate::utils::http_client;

/// Discord channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Optional username for the webhook.
    pub username: Option<String>,
    /// Optional avatar URL for the webhook.
    pub avatar_url: Option<String>,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            username: Some("GeoLive".to_string()),
            avatar_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Discord notification channel.
pub struct DiscordChannel {
    config: DiscordConfig,
    client: Client,
}

impl DiscordChannel {
    /// Create a new Discord channel.
    pub fn new(config: DiscordConfig) -> Self {
        let client = http_client::build_client(Duration::from_secs(config.timeout_secs));
        Self { config, client }
    }

    /// Build the webhook payload for a notification.
    fn build_payload(&self, payload: &NotificationPayload) -> serde_json::Value {
        let fields: Vec<_> = payload
            .fields
            .iter()
            .map(|f| json!({ "name": f.name, "value": f.value, "inline": f.inline }))
            .collect();

        let mut embed = json!({
            "title": payload.title,
            "color": payload.color,
            "fields": fields,
            "footer": { "text": payload.footer },
        });

        if let Some(url) = &payload.thumbnail_url {
            embed["thumbnail"] = json!({ "url": url });
        }
        if let Some(url) = &payload.image_url {
            embed["image"] = json!({ "url": url });
        }
        if let Some(url) = &payload.url {
            embed["url"] = json!(url);
        }
        if let Some(ts) = &payload.timestamp {
            embed["timestamp"] = json!(ts.to_rfc3339());
        }

        let mut body = json!({
            "embeds": [embed]
        });

        if let Some(artifact) = &payload.attachment {
            body["attachments"] = json!([{ "id": 0, "filename": artifact.filename }]);
        }
        if let Some(username) = &self.config.username {
            body["username"] = json!(username);
        }
        if let Some(avatar_url) = &self.config.avatar_url {
            body["avatar_url"] = json!(avatar_url);
        }

        body
    }

    async fn post(
        &self,
        destination: &Destination,
        payload: &NotificationPayload,
    ) -> Result<Response, SendError> {
        let body = self.build_payload(payload);
        let request = self.client.post(&destination.webhook_url);

        let request = match &payload.attachment {
            Some(artifact) => {
                let file = Part::bytes(artifact.data.to_vec())
                    .file_name(artifact.filename.clone())
                    .mime_str(&artifact.content_type)
                    .map_err(|e| SendError::Transient(format!("invalid attachment type: {e}")))?;
                let form = Form::new()
                    .text("payload_json", body.to_string())
                    .part("files[0]", file);
                request.multipart(form)
            }
            None => request.json(&body),
        };

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                SendError::Timeout(Duration::from_secs(self.config.timeout_secs))
            } else {
                SendError::Transient(format!("Discord request failed: {e}"))
            }
        })
    }

    /// Parse the Retry-After duration from a 429 response.
    fn parse_retry_after(response: &Response) -> Option<Duration> {
        // Discord sets Retry-After; X-RateLimit-Reset-After is the fallback.
        ["Retry-After", "X-RateLimit-Reset-After"]
            .iter()
            .find_map(|name| response.headers().get(*name)?.to_str().ok())
            .and_then(retry_after_from_header)
    }
}

/// Seconds from a rate-limit header. Values a `Duration` cannot hold are
/// treated as absent.
fn retry_after_from_header(raw: &str) -> Option<Duration> {
    let secs = raw.trim().parse::<f64>().ok()?;
    if secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// Map a non-success webhook status to a delivery error.
fn classify_status(status: StatusCode, body: &str, retry_after: Option<Duration>) -> SendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
            SendError::PermissionDenied(format!("Discord webhook rejected: {status} - {body}"))
        }
        StatusCode::TOO_MANY_REQUESTS => SendError::RateLimited { retry_after },
        _ => SendError::Transient(format!("Discord webhook failed: {status} - {body}")),
    }
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    fn channel_type(&self) -> &'static str {
        "discord"
    }

    async fn send(
        &self,
        destination: &Destination,
        payload: &NotificationPayload,
    ) -> Result<(), SendError> {
        if destination.webhook_url.is_empty() {
            return Err(SendError::PermissionDenied(format!(
                "destination {} has no webhook URL",
                destination.id
            )));
        }

        let response = self.post(destination, payload).await?;
        let status = response.status();

        if status.is_success() {
            debug!(destination = %destination.id, "Discord notification sent");
            return Ok(());
        }

        let retry_after = Self::parse_retry_after(&response);
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body, retry_after))
    }
}
