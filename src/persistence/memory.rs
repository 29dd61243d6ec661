//! In-memory record store.
//!
//! All tables sit behind a single [`tokio::sync::RwLock`], so referential
//! checks (rule still referenced, occurrence already pinned) and the writes
//! they guard happen under the same lock.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::RecordStore;
use super::models::{StoredEvent, StoredOccurrence, StoredRule};
use crate::domain::{EventId, OccurrenceId, RuleId};
use crate::error::CalendarError;

#[derive(Debug, Default)]
struct Tables {
    rules: HashMap<Uuid, StoredRule>,
    events: HashMap<Uuid, StoredEvent>,
    occurrences: HashMap<Uuid, StoredOccurrence>,
}

impl Tables {
    fn check_rule_ref(&self, event: &StoredEvent) -> Result<(), CalendarError> {
        match event.rule_id {
            Some(rule_id) if !self.rules.contains_key(&rule_id) => {
                Err(CalendarError::RuleNotFound(RuleId::from_uuid(rule_id)))
            }
            _ => Ok(()),
        }
    }

    fn events_for_rule(&self, rule_id: Uuid) -> Vec<EventId> {
        let mut ids: Vec<EventId> = self
            .events
            .values()
            .filter(|event| event.rule_id == Some(rule_id))
            .map(StoredEvent::event_id)
            .collect();
        ids.sort_by_key(|id| *id.as_uuid());
        ids
    }

    fn occurrences_for_rule(&self, rule_id: Uuid) -> usize {
        self.occurrences
            .values()
            .filter(|occ| {
                self.events
                    .get(&occ.event_id)
                    .is_some_and(|event| event.rule_id == Some(rule_id))
            })
            .count()
    }

    fn check_schedule(
        &self,
        event: &StoredEvent,
        schedule: Option<&StoredRule>,
    ) -> Result<(), CalendarError> {
        let current = event.rule_id.and_then(|rule_id| self.rules.get(&rule_id));
        let unchanged = match (current, schedule) {
            (None, None) => event.rule_id.is_none(),
            (Some(current), Some(expected)) => current.same_schedule(expected),
            _ => false,
        };
        if unchanged {
            Ok(())
        } else {
            Err(CalendarError::ScheduleChanged(event.event_id()))
        }
    }
}

/// Record store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    async fn insert_rule(&self, rule: StoredRule) -> Result<(), CalendarError> {
        let mut tables = self.tables.write().await;
        if tables.rules.contains_key(&rule.id) {
            return Err(CalendarError::InvalidRequest(format!(
                "rule {} already exists",
                rule.id
            )));
        }
        tables.rules.insert(rule.id, rule);
        Ok(())
    }

    async fn get_rule(&self, id: RuleId) -> Result<StoredRule, CalendarError> {
        let tables = self.tables.read().await;
        tables
            .rules
            .get(id.as_uuid())
            .cloned()
            .ok_or(CalendarError::RuleNotFound(id))
    }

    async fn list_rules(&self) -> Result<Vec<StoredRule>, CalendarError> {
        let tables = self.tables.read().await;
        let mut rules: Vec<StoredRule> = tables.rules.values().cloned().collect();
        rules.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rules)
    }

    async fn update_rule_unless_pinned(&self, rule: StoredRule) -> Result<(), CalendarError> {
        let mut tables = self.tables.write().await;
        let rule_id = RuleId::from_uuid(rule.id);
        if !tables.rules.contains_key(&rule.id) {
            return Err(CalendarError::RuleNotFound(rule_id));
        }
        let pinned = tables.occurrences_for_rule(rule.id);
        if pinned > 0 {
            return Err(CalendarError::RuleInUse {
                rule_id,
                reason: format!("{pinned} persisted occurrence(s) depend on its schedule"),
            });
        }
        tables.rules.insert(rule.id, rule);
        Ok(())
    }

    async fn delete_rule(&self, id: RuleId) -> Result<(), CalendarError> {
        let mut tables = self.tables.write().await;
        if !tables.rules.contains_key(id.as_uuid()) {
            return Err(CalendarError::RuleNotFound(id));
        }
        let referencing = tables.events_for_rule(*id.as_uuid());
        if !referencing.is_empty() {
            return Err(CalendarError::RuleInUse {
                rule_id: id,
                reason: format!("{} event(s) reference it", referencing.len()),
            });
        }
        tables.rules.remove(id.as_uuid());
        Ok(())
    }

    async fn events_for_rule(&self, id: RuleId) -> Result<Vec<EventId>, CalendarError> {
        let tables = self.tables.read().await;
        Ok(tables.events_for_rule(*id.as_uuid()))
    }

    async fn insert_event(&self, event: StoredEvent) -> Result<(), CalendarError> {
        let mut tables = self.tables.write().await;
        if tables.events.contains_key(&event.id) {
            return Err(CalendarError::InvalidRequest(format!(
                "event {} already exists",
                event.id
            )));
        }
        tables.check_rule_ref(&event)?;
        tables.events.insert(event.id, event);
        Ok(())
    }

    async fn get_event(&self, id: EventId) -> Result<StoredEvent, CalendarError> {
        let tables = self.tables.read().await;
        tables
            .events
            .get(id.as_uuid())
            .cloned()
            .ok_or(CalendarError::EventNotFound(id))
    }

    async fn list_events(&self) -> Result<Vec<StoredEvent>, CalendarError> {
        let tables = self.tables.read().await;
        let mut events: Vec<StoredEvent> = tables.events.values().cloned().collect();
        events.sort_by(|a, b| {
            (a.startdatetime.is_none(), a.startdatetime, a.id).cmp(&(
                b.startdatetime.is_none(),
                b.startdatetime,
                b.id,
            ))
        });
        Ok(events)
    }

    async fn update_event(&self, event: StoredEvent) -> Result<(), CalendarError> {
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(&event.id) {
            return Err(CalendarError::EventNotFound(event.event_id()));
        }
        tables.check_rule_ref(&event)?;
        tables.events.insert(event.id, event);
        Ok(())
    }

    async fn delete_event(&self, id: EventId) -> Result<u64, CalendarError> {
        let mut tables = self.tables.write().await;
        if tables.events.remove(id.as_uuid()).is_none() {
            return Err(CalendarError::EventNotFound(id));
        }
        let before = tables.occurrences.len();
        tables
            .occurrences
            .retain(|_, occ| occ.event_id != *id.as_uuid());
        Ok((before - tables.occurrences.len()) as u64)
    }

    async fn create_occurrence(
        &self,
        occurrence: StoredOccurrence,
        schedule: Option<StoredRule>,
    ) -> Result<(StoredOccurrence, bool), CalendarError> {
        let mut tables = self.tables.write().await;
        let event = tables.events.get(&occurrence.event_id).ok_or(
            CalendarError::EventNotFound(EventId::from_uuid(occurrence.event_id)),
        )?;
        tables.check_schedule(event, schedule.as_ref())?;
        let existing = tables.occurrences.values().find(|occ| {
            occ.event_id == occurrence.event_id && occ.original_start == occurrence.original_start
        });
        if let Some(existing) = existing {
            return Ok((existing.clone(), false));
        }
        tables.occurrences.insert(occurrence.id, occurrence.clone());
        Ok((occurrence, true))
    }

    async fn get_occurrence(&self, id: OccurrenceId) -> Result<StoredOccurrence, CalendarError> {
        let tables = self.tables.read().await;
        tables
            .occurrences
            .get(id.as_uuid())
            .cloned()
            .ok_or(CalendarError::OccurrenceNotFound(id))
    }

    async fn list_occurrences(
        &self,
        event_id: EventId,
    ) -> Result<Vec<StoredOccurrence>, CalendarError> {
        let tables = self.tables.read().await;
        let mut occurrences: Vec<StoredOccurrence> = tables
            .occurrences
            .values()
            .filter(|occ| occ.event_id == *event_id.as_uuid())
            .cloned()
            .collect();
        occurrences.sort_by_key(|occ| occ.original_start);
        Ok(occurrences)
    }

    async fn delete_occurrence(&self, id: OccurrenceId) -> Result<(), CalendarError> {
        let mut tables = self.tables.write().await;
        tables
            .occurrences
            .remove(id.as_uuid())
            .map(|_| ())
            .ok_or(CalendarError::OccurrenceNotFound(id))
    }
}
