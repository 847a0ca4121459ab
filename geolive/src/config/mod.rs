//! Startup configuration.

mod settings;

pub use settings::{MAX_POLL_INTERVAL_HOURS, PLACEHOLDER_ICON_URL, Settings};
