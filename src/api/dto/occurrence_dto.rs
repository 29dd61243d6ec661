//! DTOs for calendar queries and persisted occurrences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{EventId, EventOccurrence, Occurrence, OccurrenceId, RuleId, UserId, Window};
use crate::error::CalendarError;

/// Explicit window bounds for occurrence queries. Both ends are inclusive.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WindowQuery {
    /// Window start (RFC 3339).
    pub start: DateTime<Utc>,
    /// Window end (RFC 3339).
    pub end: DateTime<Utc>,
}

impl WindowQuery {
    /// Validates the bounds into a [`Window`].
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidWindowBound`] if `end < start`.
    pub fn window(&self) -> Result<Window, CalendarError> {
        Window::new(self.start, self.end)
    }
}

/// Bounds of the window a query was answered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WindowDto {
    /// First instant included.
    pub start: DateTime<Utc>,
    /// Last instant included.
    pub end: DateTime<Utc>,
}

impl From<Window> for WindowDto {
    fn from(window: Window) -> Self {
        Self {
            start: window.start(),
            end: window.end(),
        }
    }
}

/// One concrete instance of an event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventOccurrenceDto {
    /// Originating event.
    pub event_id: EventId,
    /// Event name.
    pub name: String,
    /// Event creator.
    pub creator: UserId,
    /// Rule the instance was expanded from.
    pub rule_id: Option<RuleId>,
    /// Instance start.
    pub startdatetime: DateTime<Utc>,
    /// Instance end.
    pub enddatetime: DateTime<Utc>,
    /// All-day flag.
    pub allday: bool,
    /// Persisted occurrence pinning this instance, if any.
    pub occurrence_id: Option<OccurrenceId>,
}

impl From<EventOccurrence> for EventOccurrenceDto {
    fn from(occ: EventOccurrence) -> Self {
        Self {
            event_id: occ.event_id,
            name: occ.name,
            creator: occ.creator,
            rule_id: occ.rule_id,
            startdatetime: occ.startdatetime,
            enddatetime: occ.enddatetime,
            allday: occ.allday,
            occurrence_id: occ.occurrence_id,
        }
    }
}

/// Event-shaped occurrences inside a window.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventOccurrencesResponse {
    /// Queried event.
    pub event_id: EventId,
    /// Window the occurrences were materialized for.
    pub window: WindowDto,
    /// Occurrences in increasing start order.
    pub data: Vec<EventOccurrenceDto>,
}

/// Occurrence start instants inside a window.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OccurrenceTimesResponse {
    /// Queried event.
    pub event_id: EventId,
    /// Window the occurrences were expanded for.
    pub window: WindowDto,
    /// Start instants in increasing order.
    pub occurrences: Vec<DateTime<Utc>>,
}

/// Request body for pinning an occurrence.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PinOccurrenceRequest {
    /// Rule-computed start of the instance to pin.
    pub start: DateTime<Utc>,
}

/// A persisted occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OccurrenceResponse {
    /// Occurrence identifier.
    pub id: OccurrenceId,
    /// Originating event.
    pub event_id: EventId,
    /// Start of the pinned instance.
    pub original_start: DateTime<Utc>,
    /// When the occurrence was persisted.
    pub created_at: DateTime<Utc>,
}

impl From<&Occurrence> for OccurrenceResponse {
    fn from(occ: &Occurrence) -> Self {
        Self {
            id: occ.id,
            event_id: occ.event_id,
            original_start: occ.original_start,
            created_at: occ.created_at,
        }
    }
}

/// Persisted occurrences of one event.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OccurrenceListResponse {
    /// Owning event.
    pub event_id: EventId,
    /// Occurrences in increasing start order.
    pub data: Vec<OccurrenceResponse>,
}
