//! DTOs for event endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PaginationMeta;
use crate::domain::{Event, EventId, RuleId, UserId};
use crate::service::EventDraft;

/// Request body for `POST /events` and `PUT /events/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EventRequest {
    /// Display label (1 to 36 characters).
    pub name: String,
    /// Identity creating the event.
    pub creator: UserId,
    /// Rule to repeat by; omit for a one-time event.
    #[serde(default)]
    pub rule_id: Option<RuleId>,
    /// Start of the first occurrence (RFC 3339).
    #[serde(default)]
    pub startdatetime: Option<DateTime<Utc>>,
    /// End of the first occurrence (RFC 3339).
    #[serde(default)]
    pub enddatetime: Option<DateTime<Utc>>,
    /// Whether the event spans whole days.
    #[serde(default)]
    pub allday: bool,
}

impl From<EventRequest> for EventDraft {
    fn from(req: EventRequest) -> Self {
        Self {
            name: req.name,
            creator: req.creator,
            rule_id: req.rule_id,
            startdatetime: req.startdatetime,
            enddatetime: req.enddatetime,
            allday: req.allday,
        }
    }
}

/// An event as stored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    /// Event identifier.
    pub id: EventId,
    /// Display label.
    pub name: String,
    /// Creator identity.
    pub creator: UserId,
    /// Referenced rule, if the event repeats.
    pub rule_id: Option<RuleId>,
    /// Anchor start.
    pub startdatetime: Option<DateTime<Utc>>,
    /// Anchor end.
    pub enddatetime: Option<DateTime<Utc>>,
    /// All-day flag.
    pub allday: bool,
}

impl From<&Event> for EventResponse {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            creator: event.creator,
            rule_id: event.rule_id(),
            startdatetime: event.startdatetime,
            enddatetime: event.enddatetime,
            allday: event.allday,
        }
    }
}

/// Paginated list of events.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventListResponse {
    /// Events on this page.
    pub data: Vec<EventResponse>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response for `DELETE /events/{id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteEventResponse {
    /// Deleted event.
    pub event_id: EventId,
    /// Number of persisted occurrences removed with it.
    pub occurrences_removed: u64,
}
