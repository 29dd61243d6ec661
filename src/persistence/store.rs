//! Runtime selection between the in-memory and PostgreSQL stores.

use super::RecordStore;
use super::memory::MemoryStore;
use super::models::{StoredEvent, StoredOccurrence, StoredRule};
use super::postgres::PostgresStore;
use crate::domain::{EventId, OccurrenceId, RuleId};
use crate::error::CalendarError;

/// The record store chosen at startup from `PERSISTENCE_ENABLED`.
#[derive(Debug)]
pub enum Store {
    /// Process-local tables; contents are lost on restart.
    Memory(MemoryStore),
    /// PostgreSQL tables.
    Postgres(PostgresStore),
}

impl Store {
    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident ( $($arg:expr),* )) => {
        match $self {
            Store::Memory(store) => store.$method($($arg),*).await,
            Store::Postgres(store) => store.$method($($arg),*).await,
        }
    };
}

impl RecordStore for Store {
    async fn insert_rule(&self, rule: StoredRule) -> Result<(), CalendarError> {
        dispatch!(self, insert_rule(rule))
    }

    async fn get_rule(&self, id: RuleId) -> Result<StoredRule, CalendarError> {
        dispatch!(self, get_rule(id))
    }

    async fn list_rules(&self) -> Result<Vec<StoredRule>, CalendarError> {
        dispatch!(self, list_rules())
    }

    async fn update_rule_unless_pinned(&self, rule: StoredRule) -> Result<(), CalendarError> {
        dispatch!(self, update_rule_unless_pinned(rule))
    }

    async fn delete_rule(&self, id: RuleId) -> Result<(), CalendarError> {
        dispatch!(self, delete_rule(id))
    }

    async fn events_for_rule(&self, id: RuleId) -> Result<Vec<EventId>, CalendarError> {
        dispatch!(self, events_for_rule(id))
    }

    async fn insert_event(&self, event: StoredEvent) -> Result<(), CalendarError> {
        dispatch!(self, insert_event(event))
    }

    async fn get_event(&self, id: EventId) -> Result<StoredEvent, CalendarError> {
        dispatch!(self, get_event(id))
    }

    async fn list_events(&self) -> Result<Vec<StoredEvent>, CalendarError> {
        dispatch!(self, list_events())
    }

    async fn update_event(&self, event: StoredEvent) -> Result<(), CalendarError> {
        dispatch!(self, update_event(event))
    }

    async fn delete_event(&self, id: EventId) -> Result<u64, CalendarError> {
        dispatch!(self, delete_event(id))
    }

    async fn create_occurrence(
        &self,
        occurrence: StoredOccurrence,
        schedule: Option<StoredRule>,
    ) -> Result<(StoredOccurrence, bool), CalendarError> {
        dispatch!(self, create_occurrence(occurrence, schedule))
    }

    async fn get_occurrence(&self, id: OccurrenceId) -> Result<StoredOccurrence, CalendarError> {
        dispatch!(self, get_occurrence(id))
    }

    async fn list_occurrences(
        &self,
        event_id: EventId,
    ) -> Result<Vec<StoredOccurrence>, CalendarError> {
        dispatch!(self, list_occurrences(event_id))
    }

    async fn delete_occurrence(&self, id: OccurrenceId) -> Result<(), CalendarError> {
        dispatch!(self, delete_occurrence(id))
    }
}
