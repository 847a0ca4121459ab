//! Event feeds.
//!
//! An [`EventSource`] returns the current ordered batch of events for a feed
//! (most notable first). The selector then picks the one event worth
//! announcing this cycle.

mod http;
mod selector;

pub use http::HttpEventSource;
pub use selector::{NoEvent, select_event};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Event, FeedKind};

/// Classified failure while fetching a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("feed request timed out after {0:?}")]
    Timeout(Duration),
    #[error("feed returned HTTP status {0}")]
    HttpStatus(u16),
    #[error("malformed feed payload: {0}")]
    Malformed(String),
    #[error("feed request failed: {0}")]
    Network(String),
    #[error("no feed configured for {0}")]
    Unconfigured(FeedKind),
}

/// Source of feed events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch the current ordered list of events for `kind`.
    async fn fetch_events(&self, kind: FeedKind) -> Result<Vec<Event>, FetchError>;
}
