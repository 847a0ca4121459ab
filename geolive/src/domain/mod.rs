//! Domain types shared by the fan-out engine.

pub mod destination;
pub mod event;
pub mod feed_kind;
pub mod tenant;

pub use destination::Destination;
pub use event::{AlertEvent, Event, MissingField};
pub use feed_kind::FeedKind;
pub use tenant::{Color, DEFAULT_COLOR, TenantConfig, TenantId};
