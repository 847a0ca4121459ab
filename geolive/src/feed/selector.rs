//! Event selection.
//!
//! The source orders its batch most notable first, so selection takes the
//! head of the batch. There is no deduplication against earlier cycles: each
//! cycle announces whatever is currently on top, even if it was announced
//! before.

use crate::domain::{AlertEvent, Event, MissingField};

/// Why a batch produced nothing to announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoEvent {
    EmptyBatch,
    /// The top event lacks a field needed for display.
    Incomplete(MissingField),
}

impl std::fmt::Display for NoEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBatch => f.write_str("feed returned no events"),
            Self::Incomplete(field) => write!(f, "top event is missing {field}"),
        }
    }
}

/// Pick the event to announce from a fetched batch.
///
/// Only the first event is considered. If it is incomplete the whole cycle
/// is skipped; later events are never promoted in its place.
pub fn select_event(events: &[Event]) -> Result<AlertEvent, NoEvent> {
    let top = events.first().ok_or(NoEvent::EmptyBatch)?;
    AlertEvent::try_from(top).map_err(NoEvent::Incomplete)
}
