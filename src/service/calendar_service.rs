//! Calendar service: orchestrates rule and event CRUD, expansion and
//! occurrence pinning on top of a [`RecordStore`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{
    Event, EventId, EventOccurrence, Frequency, Occurrence, OccurrenceId, RecurrenceExpander,
    RecurrenceRule, RuleId, RuleParams, UserId, Window,
};
use crate::error::CalendarError;
use crate::persistence::{RecordStore, StoredEvent, StoredOccurrence, StoredRule};

/// Fields of a rule as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    /// Display label.
    pub name: String,
    /// Repetition unit.
    pub frequency: Frequency,
    /// Auxiliary parameters; `None` means interval 1, unbounded.
    pub params: Option<RuleParams>,
}

/// Fields of an event as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Display label.
    pub name: String,
    /// Identity creating the event.
    pub creator: UserId,
    /// Rule to repeat by, if any.
    pub rule_id: Option<RuleId>,
    /// Anchor start.
    pub startdatetime: Option<DateTime<Utc>>,
    /// Anchor end.
    pub enddatetime: Option<DateTime<Utc>>,
    /// All-day flag.
    pub allday: bool,
}

/// Orchestration layer for all calendar operations.
///
/// Stateless coordinator: the store holds the records and the
/// [`RecurrenceExpander`] does the date arithmetic. Rules are resolved and
/// decoded here so the domain layer only ever sees typed values.
#[derive(Debug)]
pub struct CalendarService<S> {
    store: Arc<S>,
    expander: RecurrenceExpander,
}

impl<S> Clone for CalendarService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            expander: self.expander,
        }
    }
}

impl<S: RecordStore> CalendarService<S> {
    /// Creates a new `CalendarService`.
    #[must_use]
    pub fn new(store: Arc<S>, expander: RecurrenceExpander) -> Self {
        Self { store, expander }
    }

    // -- rules --------------------------------------------------------------

    /// Creates and stores a new rule.
    ///
    /// # Errors
    ///
    /// Returns a [`CalendarError`] if the name is invalid or the store fails.
    pub async fn create_rule(&self, draft: RuleDraft) -> Result<RecurrenceRule, CalendarError> {
        let rule = RecurrenceRule::new(draft.name, draft.frequency, draft.params)?;
        self.store.insert_rule(StoredRule::from_rule(&rule)?).await?;
        tracing::info!(
            rule_id = %rule.id,
            frequency = %rule.frequency,
            unbounded = rule.effective_params().is_unbounded(),
            "rule created"
        );
        Ok(rule)
    }

    /// Loads a rule, decoding its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::RuleNotFound`] or
    /// [`CalendarError::CorruptParameterEncoding`].
    pub async fn get_rule(&self, id: RuleId) -> Result<RecurrenceRule, CalendarError> {
        self.store.get_rule(id).await?.into_rule()
    }

    /// Lists all rules ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a [`CalendarError`] on store failure or a damaged row.
    pub async fn list_rules(&self) -> Result<Vec<RecurrenceRule>, CalendarError> {
        self.store
            .list_rules()
            .await?
            .into_iter()
            .map(StoredRule::into_rule)
            .collect()
    }

    /// Replaces a rule's name, frequency and parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::RuleNotFound`] for an unknown rule and
    /// [`CalendarError::RuleInUse`] once any persisted occurrence exists for
    /// an event using the rule.
    pub async fn update_rule(
        &self,
        id: RuleId,
        draft: RuleDraft,
    ) -> Result<RecurrenceRule, CalendarError> {
        let rule = RecurrenceRule {
            id,
            name: draft.name,
            frequency: draft.frequency,
            params: draft.params,
        };
        rule.validate()?;
        self.store
            .update_rule_unless_pinned(StoredRule::from_rule(&rule)?)
            .await?;
        tracing::info!(rule_id = %id, frequency = %rule.frequency, "rule updated");
        Ok(rule)
    }

    /// Deletes a rule that no event references.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::RuleInUse`] while events reference it.
    pub async fn delete_rule(&self, id: RuleId) -> Result<(), CalendarError> {
        self.store.delete_rule(id).await?;
        tracing::info!(rule_id = %id, "rule deleted");
        Ok(())
    }

    /// Events that reference a rule.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::RuleNotFound`] for an unknown rule.
    pub async fn events_for_rule(&self, id: RuleId) -> Result<Vec<EventId>, CalendarError> {
        self.store.get_rule(id).await?;
        self.store.events_for_rule(id).await
    }

    // -- events -------------------------------------------------------------

    /// Validates and stores a new event.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::RuleNotFound`] for an unknown rule and the
    /// errors of [`Event::validate`].
    pub async fn create_event(&self, draft: EventDraft) -> Result<Event, CalendarError> {
        let event = self.build_event(EventId::new(), draft).await?;
        self.store.insert_event(StoredEvent::from_event(&event)).await?;
        tracing::info!(event_id = %event.id, rule_id = ?event.rule_id(), "event created");
        Ok(event)
    }

    /// Loads an event with its rule resolved.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::EventNotFound`] or a rule decoding error.
    pub async fn get_event(&self, id: EventId) -> Result<Event, CalendarError> {
        let row = self.store.get_event(id).await?;
        let rule = match row.rule_id() {
            Some(rule_id) => Some(self.get_rule(rule_id).await?),
            None => None,
        };
        Ok(row.into_event(rule))
    }

    /// Lists all events ordered by start, resolving each rule once.
    ///
    /// # Errors
    ///
    /// Returns a [`CalendarError`] on store failure or a damaged rule row.
    pub async fn list_events(&self) -> Result<Vec<Event>, CalendarError> {
        let rows = self.store.list_events().await?;
        let mut rules: HashMap<RuleId, RecurrenceRule> = HashMap::new();
        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let rule = match row.rule_id() {
                Some(rule_id) => {
                    if !rules.contains_key(&rule_id) {
                        let rule = self.get_rule(rule_id).await?;
                        rules.insert(rule_id, rule);
                    }
                    rules.get(&rule_id).cloned()
                }
                None => None,
            };
            events.push(row.into_event(rule));
        }
        Ok(events)
    }

    /// Replaces an event's fields.
    ///
    /// Persisted occurrences keep their `original_start`; ones that no
    /// longer match the new schedule simply stop being cross-referenced.
    ///
    /// # Errors
    ///
    /// As [`CalendarService::create_event`], plus
    /// [`CalendarError::EventNotFound`].
    pub async fn update_event(&self, id: EventId, draft: EventDraft) -> Result<Event, CalendarError> {
        self.store.get_event(id).await?;
        let event = self.build_event(id, draft).await?;
        self.store.update_event(StoredEvent::from_event(&event)).await?;
        tracing::info!(event_id = %id, rule_id = ?event.rule_id(), "event updated");
        Ok(event)
    }

    /// Deletes an event and its persisted occurrences.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::EventNotFound`].
    pub async fn delete_event(&self, id: EventId) -> Result<u64, CalendarError> {
        let removed = self.store.delete_event(id).await?;
        tracing::info!(event_id = %id, occurrences_removed = removed, "event deleted");
        Ok(removed)
    }

    // -- calendar queries ---------------------------------------------------

    /// Event-shaped occurrences inside `window`, with `occurrence_id` set on
    /// instances that have been pinned.
    ///
    /// # Errors
    ///
    /// Propagates lookup and expansion errors.
    pub async fn event_occurrences(
        &self,
        event_id: EventId,
        window: Window,
    ) -> Result<Vec<EventOccurrence>, CalendarError> {
        let event = self.get_event(event_id).await?;
        let mut occurrences = event.get_event_occurrences(&self.expander, window)?;
        if occurrences.is_empty() {
            return Ok(occurrences);
        }
        let pinned: HashMap<DateTime<Utc>, OccurrenceId> = self
            .store
            .list_occurrences(event_id)
            .await?
            .into_iter()
            .map(|row| (row.original_start, OccurrenceId::from_uuid(row.id)))
            .collect();
        for occurrence in &mut occurrences {
            occurrence.occurrence_id = pinned.get(&occurrence.startdatetime).copied();
        }
        tracing::debug!(%event_id, count = occurrences.len(), "occurrences materialized");
        Ok(occurrences)
    }

    /// Occurrence start instants of a recurring event inside `window`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::MissingRecurrenceRule`] for a one-time event,
    /// otherwise as [`Event::get_occurrences`].
    pub async fn occurrence_times(
        &self,
        event_id: EventId,
        window: Window,
    ) -> Result<Vec<DateTime<Utc>>, CalendarError> {
        let event = self.get_event(event_id).await?;
        event.get_occurrences(&self.expander, window)
    }

    /// Occurrence starts within a calendar month.
    ///
    /// # Errors
    ///
    /// As [`Event::get_month_occurrences`].
    pub async fn month_occurrences(
        &self,
        event_id: EventId,
        year: i32,
        month: u32,
    ) -> Result<Vec<DateTime<Utc>>, CalendarError> {
        let event = self.get_event(event_id).await?;
        event.get_month_occurrences(&self.expander, year, month)
    }

    /// Occurrence starts within a Sunday-first week.
    ///
    /// # Errors
    ///
    /// As [`Event::get_week_occurrences`].
    pub async fn week_occurrences(
        &self,
        event_id: EventId,
        year: i32,
        week: u32,
    ) -> Result<Vec<DateTime<Utc>>, CalendarError> {
        let event = self.get_event(event_id).await?;
        event.get_week_occurrences(&self.expander, year, week)
    }

    // -- persisted occurrences ----------------------------------------------

    /// Pins the instance of `event_id` starting at `start`.
    ///
    /// Returns the occurrence and whether it was newly created; a repeat
    /// request returns the existing one.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::NotAnOccurrence`] if the event's schedule
    /// does not produce `start`, and [`CalendarError::ScheduleChanged`] if
    /// the rule was replaced before the occurrence could be stored.
    pub async fn persist_occurrence(
        &self,
        event_id: EventId,
        start: DateTime<Utc>,
    ) -> Result<(Occurrence, bool), CalendarError> {
        let event = self.get_event(event_id).await?;
        if !event.occurs_at(&self.expander, start)? {
            return Err(CalendarError::NotAnOccurrence { event_id, start });
        }
        let schedule = event.rule.as_ref().map(StoredRule::from_rule).transpose()?;
        let candidate = Occurrence::new(event_id, start);
        let (row, created) = self
            .store
            .create_occurrence(StoredOccurrence::from(&candidate), schedule)
            .await?;
        let occurrence = Occurrence::from(row);
        if created {
            tracing::info!(occurrence_id = %occurrence.id, %event_id, %start, "occurrence persisted");
        }
        Ok((occurrence, created))
    }

    /// Loads a persisted occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::OccurrenceNotFound`].
    pub async fn get_occurrence(&self, id: OccurrenceId) -> Result<Occurrence, CalendarError> {
        Ok(self.store.get_occurrence(id).await?.into())
    }

    /// Lists the persisted occurrences of an event.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::EventNotFound`].
    pub async fn list_persisted_occurrences(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Occurrence>, CalendarError> {
        self.store.get_event(event_id).await?;
        Ok(self
            .store
            .list_occurrences(event_id)
            .await?
            .into_iter()
            .map(Occurrence::from)
            .collect())
    }

    /// Deletes a persisted occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::OccurrenceNotFound`].
    pub async fn delete_occurrence(&self, id: OccurrenceId) -> Result<(), CalendarError> {
        self.store.delete_occurrence(id).await?;
        tracing::info!(occurrence_id = %id, "occurrence deleted");
        Ok(())
    }

    async fn build_event(&self, id: EventId, draft: EventDraft) -> Result<Event, CalendarError> {
        let rule = match draft.rule_id {
            Some(rule_id) => Some(self.get_rule(rule_id).await?),
            None => None,
        };
        let event = Event {
            id,
            name: draft.name,
            creator: draft.creator,
            rule,
            startdatetime: draft.startdatetime,
            enddatetime: draft.enddatetime,
            allday: draft.allday,
        };
        event.validate()?;
        Ok(event)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use chrono::{TimeZone, Weekday};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        let Some(dt) = Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single() else {
            panic!("invalid test date");
        };
        dt
    }

    fn service() -> CalendarService<MemoryStore> {
        CalendarService::new(Arc::new(MemoryStore::new()), RecurrenceExpander::default())
    }

    fn weekly(name: &str) -> RuleDraft {
        RuleDraft {
            name: name.to_string(),
            frequency: Frequency::Weekly,
            params: None,
        }
    }

    fn lesson(rule_id: Option<RuleId>) -> EventDraft {
        EventDraft {
            name: "Chemistry".to_string(),
            creator: UserId::new(),
            rule_id,
            startdatetime: Some(at(2024, 1, 1, 9)),
            enddatetime: Some(at(2024, 1, 1, 10)),
            allday: false,
        }
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> Window {
        let Ok(w) = Window::new(start, end) else {
            panic!("valid window");
        };
        w
    }

    async fn weekly_event(svc: &CalendarService<MemoryStore>) -> (RecurrenceRule, Event) {
        let Ok(rule) = svc.create_rule(weekly("Weekly")).await else {
            panic!("create rule failed");
        };
        let Ok(event) = svc.create_event(lesson(Some(rule.id))).await else {
            panic!("create event failed");
        };
        (rule, event)
    }

    #[tokio::test]
    async fn rule_round_trips_through_store() {
        let svc = service();
        let Ok(params) = RuleParams::new(2, Some(5), None, [Weekday::Tue, Weekday::Mon]) else {
            panic!("valid params");
        };
        let draft = RuleDraft {
            params: Some(params.clone()),
            ..weekly("Fortnightly")
        };
        let Ok(created) = svc.create_rule(draft).await else {
            panic!("create failed");
        };
        let Ok(loaded) = svc.get_rule(created.id).await else {
            panic!("get failed");
        };
        assert_eq!(loaded.get_params(), Some(&params));
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn event_with_unknown_rule_is_rejected() {
        let svc = service();
        let result = svc.create_event(lesson(Some(RuleId::new()))).await;
        assert!(matches!(result, Err(CalendarError::RuleNotFound(_))));
    }

    #[tokio::test]
    async fn unscheduled_recurring_event_is_rejected() {
        let svc = service();
        let Ok(rule) = svc.create_rule(weekly("Weekly")).await else {
            panic!("create rule failed");
        };
        let draft = EventDraft {
            startdatetime: None,
            enddatetime: None,
            ..lesson(Some(rule.id))
        };
        let result = svc.create_event(draft).await;
        assert!(matches!(result, Err(CalendarError::EventNotScheduled(_))));
    }

    #[tokio::test]
    async fn weekly_occurrences_in_window() {
        let svc = service();
        let (rule, event) = weekly_event(&svc).await;
        let Ok(occurrences) = svc
            .event_occurrences(event.id, window(at(2024, 1, 1, 0), at(2024, 1, 22, 23)))
            .await
        else {
            panic!("query failed");
        };
        let starts: Vec<DateTime<Utc>> = occurrences.iter().map(|o| o.startdatetime).collect();
        assert_eq!(
            starts,
            vec![
                at(2024, 1, 1, 9),
                at(2024, 1, 8, 9),
                at(2024, 1, 15, 9),
                at(2024, 1, 22, 9)
            ]
        );
        assert!(occurrences.iter().all(|o| o.rule_id == Some(rule.id)));
        assert!(
            occurrences
                .iter()
                .all(|o| o.enddatetime - o.startdatetime == chrono::TimeDelta::hours(1))
        );
    }

    #[tokio::test]
    async fn pinned_occurrences_are_cross_referenced() {
        let svc = service();
        let (_, event) = weekly_event(&svc).await;
        let Ok((pinned, created)) = svc.persist_occurrence(event.id, at(2024, 1, 8, 9)).await
        else {
            panic!("persist failed");
        };
        assert!(created);

        let Ok(occurrences) = svc
            .event_occurrences(event.id, window(at(2024, 1, 1, 0), at(2024, 1, 14, 0)))
            .await
        else {
            panic!("query failed");
        };
        let ids: Vec<Option<OccurrenceId>> =
            occurrences.iter().map(|o| o.occurrence_id).collect();
        assert_eq!(ids, vec![None, Some(pinned.id)]);
    }

    #[tokio::test]
    async fn persisting_twice_returns_the_same_occurrence() {
        let svc = service();
        let (_, event) = weekly_event(&svc).await;
        let Ok((first, _)) = svc.persist_occurrence(event.id, at(2024, 1, 15, 9)).await else {
            panic!("persist failed");
        };
        let Ok((second, created)) = svc.persist_occurrence(event.id, at(2024, 1, 15, 9)).await
        else {
            panic!("persist failed");
        };
        assert!(!created);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn off_schedule_start_is_not_an_occurrence() {
        let svc = service();
        let (_, event) = weekly_event(&svc).await;
        let result = svc.persist_occurrence(event.id, at(2024, 1, 9, 9)).await;
        assert!(matches!(result, Err(CalendarError::NotAnOccurrence { .. })));
    }

    #[tokio::test]
    async fn rule_in_use_cannot_be_deleted() {
        let svc = service();
        let (rule, event) = weekly_event(&svc).await;
        let result = svc.delete_rule(rule.id).await;
        assert!(matches!(result, Err(CalendarError::RuleInUse { .. })));

        let Ok(referencing) = svc.events_for_rule(rule.id).await else {
            panic!("lookup failed");
        };
        assert_eq!(referencing, vec![event.id]);
    }

    #[tokio::test]
    async fn rule_with_pinned_occurrences_cannot_change() {
        let svc = service();
        let (rule, event) = weekly_event(&svc).await;
        assert!(svc.update_rule(rule.id, weekly("Renamed")).await.is_ok());

        let _ = svc.persist_occurrence(event.id, at(2024, 1, 8, 9)).await;
        let result = svc.update_rule(rule.id, weekly("Again")).await;
        assert!(matches!(result, Err(CalendarError::RuleInUse { .. })));
    }

    #[tokio::test]
    async fn unknown_rule_cannot_be_updated() {
        let svc = service();
        let result = svc.update_rule(RuleId::new(), weekly("Weekly")).await;
        assert!(matches!(result, Err(CalendarError::RuleNotFound(_))));
    }

    #[tokio::test]
    async fn pin_after_concurrent_rule_change_is_refused() {
        let svc = service();
        let (rule, event) = weekly_event(&svc).await;
        // A request validated `start` against the weekly rule, then the rule
        // became daily before the pin reached the store.
        let Ok(stale) = StoredRule::from_rule(&rule) else {
            panic!("encode failed");
        };
        let daily = RuleDraft {
            frequency: Frequency::Daily,
            ..weekly("Daily")
        };
        assert!(svc.update_rule(rule.id, daily).await.is_ok());

        let start = at(2024, 1, 8, 9);
        let row = StoredOccurrence::from(&Occurrence::new(event.id, start));
        let result = svc.store.create_occurrence(row, Some(stale)).await;
        assert!(matches!(result, Err(CalendarError::ScheduleChanged(_))));

        // Validated against the current rule, the same instant pins fine.
        assert!(matches!(
            svc.persist_occurrence(event.id, start).await,
            Ok((_, true))
        ));
    }

    #[tokio::test]
    async fn deleting_event_removes_pins_and_frees_rule() {
        let svc = service();
        let (rule, event) = weekly_event(&svc).await;
        let Ok((pinned, _)) = svc.persist_occurrence(event.id, at(2024, 1, 8, 9)).await else {
            panic!("persist failed");
        };
        assert!(matches!(svc.delete_event(event.id).await, Ok(1)));
        assert!(matches!(
            svc.get_occurrence(pinned.id).await,
            Err(CalendarError::OccurrenceNotFound(_))
        ));
        assert!(svc.delete_rule(rule.id).await.is_ok());
    }

    #[tokio::test]
    async fn month_and_week_queries() {
        let svc = service();
        let (_, event) = weekly_event(&svc).await;
        let Ok(february) = svc.month_occurrences(event.id, 2024, 2).await else {
            panic!("month query failed");
        };
        assert_eq!(february.len(), 4);
        assert_eq!(february.first(), Some(&at(2024, 2, 5, 9)));

        // Week 2 of 2024 runs Sunday Jan 14 through Saturday Jan 20.
        let Ok(week) = svc.week_occurrences(event.id, 2024, 2).await else {
            panic!("week query failed");
        };
        assert_eq!(week, vec![at(2024, 1, 15, 9)]);

        let bad = svc.month_occurrences(event.id, 2024, 13).await;
        assert!(matches!(bad, Err(CalendarError::InvalidWindowBound(_))));
    }

    #[tokio::test]
    async fn one_time_event_has_no_occurrence_times() {
        let svc = service();
        let Ok(event) = svc.create_event(lesson(None)).await else {
            panic!("create failed");
        };
        let result = svc
            .occurrence_times(event.id, window(at(2024, 1, 1, 0), at(2024, 2, 1, 0)))
            .await;
        assert!(matches!(result, Err(CalendarError::MissingRecurrenceRule(_))));

        let Ok(single) = svc
            .event_occurrences(event.id, window(at(2024, 1, 1, 0), at(2024, 2, 1, 0)))
            .await
        else {
            panic!("query failed");
        };
        assert_eq!(single.len(), 1);
    }

    #[tokio::test]
    async fn list_events_resolves_rules() {
        let svc = service();
        let (rule, _) = weekly_event(&svc).await;
        let _ = svc.create_event(lesson(Some(rule.id))).await;
        let _ = svc.create_event(lesson(None)).await;
        let Ok(events) = svc.list_events().await else {
            panic!("list failed");
        };
        assert_eq!(events.len(), 3);
        assert_eq!(events.iter().filter(|e| e.rule.is_some()).count(), 2);
    }
}
