//! Stored row models for rules, events and occurrences.
//!
//! These mirror the database columns. Rule parameters appear here only in
//! their encoded byte form; converting to and from the domain types is the
//! single point where encoding and decoding happen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Event, EventId, Occurrence, OccurrenceId, RecurrenceRule, RuleId, UserId,
};
use crate::error::CalendarError;

/// A row from the `recurrence_rules` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredRule {
    /// Rule identifier.
    pub id: Uuid,
    /// Display label.
    pub name: String,
    /// Frequency storage text (`YEARLY`, `MONTHLY`, `WEEKLY`, `DAILY`).
    pub frequency: String,
    /// Versioned parameter encoding, if parameters were set.
    pub params: Option<Vec<u8>>,
}

impl StoredRule {
    /// Encodes a domain rule into its row form.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Internal`] if the parameters fail to encode.
    pub fn from_rule(rule: &RecurrenceRule) -> Result<Self, CalendarError> {
        Ok(Self {
            id: *rule.id.as_uuid(),
            name: rule.name.clone(),
            frequency: rule.frequency.as_str().to_string(),
            params: rule.encoded_params()?,
        })
    }

    /// Decodes the row into a domain rule.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidRuleFrequency`] or
    /// [`CalendarError::CorruptParameterEncoding`] for damaged rows.
    pub fn into_rule(self) -> Result<RecurrenceRule, CalendarError> {
        RecurrenceRule::from_parts(
            RuleId::from_uuid(self.id),
            self.name,
            &self.frequency,
            self.params.as_deref(),
        )
    }

    /// Returns `true` if both rows describe the same rule with the same
    /// frequency and parameter bytes. The name is ignored.
    #[must_use]
    pub fn same_schedule(&self, other: &Self) -> bool {
        self.id == other.id && self.frequency == other.frequency && self.params == other.params
    }
}

/// A row from the `events` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredEvent {
    /// Event identifier.
    pub id: Uuid,
    /// Display label.
    pub name: String,
    /// Creator identity.
    pub creator: Uuid,
    /// Referenced rule, if the event repeats.
    pub rule_id: Option<Uuid>,
    /// Anchor start.
    pub startdatetime: Option<DateTime<Utc>>,
    /// Anchor end.
    pub enddatetime: Option<DateTime<Utc>>,
    /// All-day flag.
    pub allday: bool,
}

impl StoredEvent {
    /// Flattens a domain event into its row form.
    #[must_use]
    pub fn from_event(event: &Event) -> Self {
        Self {
            id: *event.id.as_uuid(),
            name: event.name.clone(),
            creator: *event.creator.as_uuid(),
            rule_id: event.rule_id().map(Uuid::from),
            startdatetime: event.startdatetime,
            enddatetime: event.enddatetime,
            allday: event.allday,
        }
    }

    /// Typed identifier of the event.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        EventId::from_uuid(self.id)
    }

    /// Typed identifier of the referenced rule.
    #[must_use]
    pub fn rule_id(&self) -> Option<RuleId> {
        self.rule_id.map(RuleId::from_uuid)
    }

    /// Builds the domain event with its rule already resolved.
    #[must_use]
    pub fn into_event(self, rule: Option<RecurrenceRule>) -> Event {
        Event {
            id: EventId::from_uuid(self.id),
            name: self.name,
            creator: UserId::from_uuid(self.creator),
            rule,
            startdatetime: self.startdatetime,
            enddatetime: self.enddatetime,
            allday: self.allday,
        }
    }
}

/// A row from the `occurrences` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredOccurrence {
    /// Occurrence identifier.
    pub id: Uuid,
    /// Originating event.
    pub event_id: Uuid,
    /// Rule-computed start of the pinned instance.
    pub original_start: DateTime<Utc>,
    /// Insertion timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Occurrence> for StoredOccurrence {
    fn from(occurrence: &Occurrence) -> Self {
        Self {
            id: *occurrence.id.as_uuid(),
            event_id: *occurrence.event_id.as_uuid(),
            original_start: occurrence.original_start,
            created_at: occurrence.created_at,
        }
    }
}

impl From<StoredOccurrence> for Occurrence {
    fn from(row: StoredOccurrence) -> Self {
        Self {
            id: OccurrenceId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            original_start: row.original_start,
            created_at: row.created_at,
        }
    }
}
