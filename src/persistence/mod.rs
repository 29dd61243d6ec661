//! Persistence layer: the record store behind the calendar.
//!
//! [`RecordStore`] is the create/read/update/delete contract the service
//! needs for rules, events and persisted occurrences, plus the relational
//! lookups used for safe deletion. Two implementations exist:
//! [`memory::MemoryStore`] for tests and database-less deployments, and
//! [`postgres::PostgresStore`] backed by `sqlx::PgPool`. [`Store`] selects
//! one at startup.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

use std::future::Future;

use crate::domain::{EventId, OccurrenceId, RuleId};
use crate::error::CalendarError;

pub use memory::MemoryStore;
pub use models::{StoredEvent, StoredOccurrence, StoredRule};
pub use postgres::PostgresStore;
pub use store::Store;

/// Generic record store for calendar data.
///
/// Lookups of missing records fail with the matching `*NotFound` error.
/// Implementations must make [`RecordStore::update_rule_unless_pinned`],
/// [`RecordStore::delete_rule`] and [`RecordStore::create_occurrence`]
/// atomic with respect to their checks.
pub trait RecordStore: Send + Sync {
    /// Inserts a new rule row.
    fn insert_rule(
        &self,
        rule: StoredRule,
    ) -> impl Future<Output = Result<(), CalendarError>> + Send;

    /// Fetches a rule row.
    fn get_rule(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<StoredRule, CalendarError>> + Send;

    /// Lists all rule rows ordered by name.
    fn list_rules(&self) -> impl Future<Output = Result<Vec<StoredRule>, CalendarError>> + Send;

    /// Replaces an existing rule row unless a persisted occurrence belongs
    /// to an event that references it, in which case it fails with
    /// [`CalendarError::RuleInUse`].
    fn update_rule_unless_pinned(
        &self,
        rule: StoredRule,
    ) -> impl Future<Output = Result<(), CalendarError>> + Send;

    /// Deletes a rule row, failing with [`CalendarError::RuleInUse`] while
    /// any event references it.
    fn delete_rule(&self, id: RuleId) -> impl Future<Output = Result<(), CalendarError>> + Send;

    /// Events that reference the rule.
    fn events_for_rule(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Vec<EventId>, CalendarError>> + Send;

    /// Inserts a new event row. The referenced rule must exist.
    fn insert_event(
        &self,
        event: StoredEvent,
    ) -> impl Future<Output = Result<(), CalendarError>> + Send;

    /// Fetches an event row.
    fn get_event(
        &self,
        id: EventId,
    ) -> impl Future<Output = Result<StoredEvent, CalendarError>> + Send;

    /// Lists all event rows ordered by start, unscheduled events last.
    fn list_events(&self)
    -> impl Future<Output = Result<Vec<StoredEvent>, CalendarError>> + Send;

    /// Replaces an existing event row. The referenced rule must exist.
    fn update_event(
        &self,
        event: StoredEvent,
    ) -> impl Future<Output = Result<(), CalendarError>> + Send;

    /// Deletes an event row together with its persisted occurrences,
    /// returning how many occurrences were removed.
    fn delete_event(&self, id: EventId)
    -> impl Future<Output = Result<u64, CalendarError>> + Send;

    /// Persists an occurrence unless one already exists for the same event
    /// and start. Returns the stored row and whether it was newly created.
    ///
    /// `schedule` is the rule row the start was validated against (`None`
    /// for a one-time event). If the event's current rule is not the same
    /// schedule the call fails with [`CalendarError::ScheduleChanged`].
    fn create_occurrence(
        &self,
        occurrence: StoredOccurrence,
        schedule: Option<StoredRule>,
    ) -> impl Future<Output = Result<(StoredOccurrence, bool), CalendarError>> + Send;

    /// Fetches a persisted occurrence.
    fn get_occurrence(
        &self,
        id: OccurrenceId,
    ) -> impl Future<Output = Result<StoredOccurrence, CalendarError>> + Send;

    /// Lists the persisted occurrences of an event ordered by start.
    fn list_occurrences(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Vec<StoredOccurrence>, CalendarError>> + Send;

    /// Deletes a persisted occurrence.
    fn delete_occurrence(
        &self,
        id: OccurrenceId,
    ) -> impl Future<Output = Result<(), CalendarError>> + Send;
}
