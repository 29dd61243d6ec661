//! Persisted occurrences.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{EventId, OccurrenceId};

/// Durable marker for one specific instance of an event.
///
/// Gives other records (e.g. attendance) a stable identifier for "this
/// instance" that does not change if the instance is shown in a different
/// window. Created on demand, never expired; immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// Occurrence identifier.
    pub id: OccurrenceId,
    /// Originating event.
    pub event_id: EventId,
    /// Rule-computed start of the pinned instance.
    pub original_start: DateTime<Utc>,
    /// When the occurrence was persisted.
    pub created_at: DateTime<Utc>,
}

impl Occurrence {
    /// Creates a new occurrence marker for `event_id` at `original_start`.
    #[must_use]
    pub fn new(event_id: EventId, original_start: DateTime<Utc>) -> Self {
        Self {
            id: OccurrenceId::new(),
            event_id,
            original_start,
            created_at: Utc::now(),
        }
    }
}
