//! HTTP-backed event source.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{EventSource, FetchError};
use crate::domain::{Event, FeedKind};
use crate::utils::http_client;

/// Default request timeout for feed polling.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Polls a JSON endpoint per feed kind.
///
/// Each endpoint must answer with a JSON array of event records ordered
/// most notable first.
pub struct HttpEventSource {
    client: Client,
    feeds: HashMap<FeedKind, Url>,
    timeout: Duration,
}

impl HttpEventSource {
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(http_client::build_client(timeout), timeout)
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            feeds: HashMap::new(),
            timeout,
        }
    }

    /// Register the endpoint serving `kind`.
    pub fn with_feed(mut self, kind: FeedKind, url: Url) -> Self {
        self.feeds.insert(kind, url);
        self
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if error.is_decode() {
            FetchError::Malformed(error.to_string())
        } else if let Some(status) = error.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch_events(&self, kind: FeedKind) -> Result<Vec<Event>, FetchError> {
        let url = self.feeds.get(&kind).ok_or(FetchError::Unconfigured(kind))?;

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        let events = parse_events(&body)?;

        debug!(feed = %kind, count = events.len(), "Fetched feed events");
        Ok(events)
    }
}

/// Decode a feed body into events.
pub(crate) fn parse_events(body: &[u8]) -> Result<Vec<Event>, FetchError> {
    serde_json::from_slice::<Vec<Event>>(body).map_err(|e| FetchError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_server::{Reply, serve_once};

    async fn source_for(reply: Reply, timeout: Duration) -> HttpEventSource {
        let base = serve_once(reply).await;
        let url = Url::parse(&format!("{base}/feed.json")).unwrap();
        HttpEventSource::new(timeout).with_feed(FeedKind::Earthquake, url)
    }

    #[test]
    fn test_parse_events_array() {
        let body = br#"[
            {"place": "A", "magnitude": 5.1, "latitude": 1.0, "longitude": 2.0},
            {"place": "B", "magnitude": "N/A"}
        ]"#;

        let events = parse_events(body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].place, "A");
        assert_eq!(events[1].magnitude, None);
    }

    #[test]
    fn test_parse_events_rejects_non_array() {
        assert!(matches!(
            parse_events(br#"{"features": []}"#),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            parse_events(b"<html>"),
            Err(FetchError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_feed() {
        let source = HttpEventSource::new(DEFAULT_FETCH_TIMEOUT);
        let result = source.fetch_events(FeedKind::Weather).await;
        assert!(matches!(result, Err(FetchError::Unconfigured(FeedKind::Weather))));
    }

    #[tokio::test]
    async fn test_fetch_events_success() {
        let body = r#"[{"place": "Ridge", "magnitude": 6.2, "latitude": -3.5, "longitude": 140.1}]"#;
        let reply = Reply::status("200 OK", &[("Content-Type", "application/json")], body);
        let source = source_for(reply, DEFAULT_FETCH_TIMEOUT).await;

        let events = source.fetch_events(FeedKind::Earthquake).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].place, "Ridge");
        assert_eq!(events[0].magnitude, Some(6.2));
    }

    #[tokio::test]
    async fn test_fetch_events_http_status() {
        let reply = Reply::status("503 Service Unavailable", &[], "down");
        let source = source_for(reply, DEFAULT_FETCH_TIMEOUT).await;

        let result = source.fetch_events(FeedKind::Earthquake).await;
        assert!(matches!(result, Err(FetchError::HttpStatus(503))));
    }

    #[tokio::test]
    async fn test_fetch_events_malformed_body() {
        let reply = Reply::status("200 OK", &[], r#"{"features": "nope"}"#);
        let source = source_for(reply, DEFAULT_FETCH_TIMEOUT).await;

        let result = source.fetch_events(FeedKind::Earthquake).await;
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_fetch_events_timeout() {
        let timeout = Duration::from_millis(200);
        let source = source_for(Reply::Stall, timeout).await;

        let result = source.fetch_events(FeedKind::Earthquake).await;
        assert!(matches!(result, Err(FetchError::Timeout(d)) if d == timeout));
    }
}
