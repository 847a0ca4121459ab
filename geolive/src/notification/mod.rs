//! Notification pipeline.
//!
//! Per tenant, one cycle runs: resolve a destination, render the artifact,
//! build the payload, dispatch it.
//!
//! # Example
//!
//! ```ignore
//! use geolive::notification::{Dispatcher, NotificationBuilder};
//! use geolive::notification::channels::{DiscordChannel, DiscordConfig};
//!
//! let channel = Arc::new(DiscordChannel::new(DiscordConfig::default()));
//! let dispatcher = Dispatcher::new(channel);
//! let payload = NotificationBuilder::new(FeedKind::Earthquake, None)
//!     .build(&event, &tenant_config, Some(artifact));
//! dispatcher.dispatch(&tenant_id, &destination, &payload).await?;
//! ```

pub mod builder;
pub mod channels;
pub mod dispatcher;
pub mod render;
pub mod resolver;

pub use builder::{EmbedField, NotificationBuilder, NotificationPayload, is_valid_http, is_valid_image_url};
pub use channels::{DiscordChannel, DiscordConfig, NotificationChannel, SendError};
pub use dispatcher::Dispatcher;
pub use render::{ATTACHMENT_SCHEME, Artifact, AssetRenderer, RenderError, PngMapRenderer};
pub use resolver::{DestinationResolver, Resolution, select_first_viable};
