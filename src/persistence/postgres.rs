//! PostgreSQL implementation of the record store.

use sqlx::PgPool;
use uuid::Uuid;

use super::RecordStore;
use super::models::{StoredEvent, StoredOccurrence, StoredRule};
use crate::domain::{EventId, OccurrenceId, RuleId};
use crate::error::CalendarError;

const EVENT_COLUMNS: &str = "id, name, creator, rule_id, startdatetime, enddatetime, allday";
const OCCURRENCE_COLUMNS: &str = "id, event_id, original_start, created_at";

/// PostgreSQL-backed record store using `sqlx::PgPool`.
///
/// Schema lives in `migrations/`. Referential rules are enforced by the
/// database: events reference rules with `ON DELETE RESTRICT`, occurrences
/// reference events with `ON DELETE CASCADE`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`CalendarError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), CalendarError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CalendarError::PersistenceError(e.to_string()))
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Maps a failed event write: a dangling `rule_id` surfaces as a missing rule.
fn event_write_error(err: sqlx::Error, event: &StoredEvent) -> CalendarError {
    match event.rule_id() {
        Some(rule_id) if is_foreign_key_violation(&err) => CalendarError::RuleNotFound(rule_id),
        _ if is_unique_violation(&err) => {
            CalendarError::InvalidRequest(format!("event {} already exists", event.id))
        }
        _ => CalendarError::from(err),
    }
}

impl RecordStore for PostgresStore {
    async fn insert_rule(&self, rule: StoredRule) -> Result<(), CalendarError> {
        sqlx::query(
            "INSERT INTO recurrence_rules (id, name, frequency, params) VALUES ($1, $2, $3, $4)",
        )
        .bind(rule.id)
        .bind(&rule.name)
        .bind(&rule.frequency)
        .bind(rule.params.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CalendarError::InvalidRequest(format!("rule {} already exists", rule.id))
            } else {
                CalendarError::from(e)
            }
        })?;
        Ok(())
    }

    async fn get_rule(&self, id: RuleId) -> Result<StoredRule, CalendarError> {
        sqlx::query_as::<_, StoredRule>(
            "SELECT id, name, frequency, params FROM recurrence_rules WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CalendarError::RuleNotFound(id))
    }

    async fn list_rules(&self) -> Result<Vec<StoredRule>, CalendarError> {
        let rows = sqlx::query_as::<_, StoredRule>(
            "SELECT id, name, frequency, params FROM recurrence_rules ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_rule_unless_pinned(&self, rule: StoredRule) -> Result<(), CalendarError> {
        let rule_id = RuleId::from_uuid(rule.id);
        let mut tx = self.pool.begin().await?;
        // Conflicts with the `FOR SHARE` taken by `create_occurrence`.
        let locked = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM recurrence_rules WHERE id = $1 FOR UPDATE",
        )
        .bind(rule.id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(CalendarError::RuleNotFound(rule_id));
        }

        let pinned = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM occurrences o JOIN events e ON e.id = o.event_id \
             WHERE e.rule_id = $1",
        )
        .bind(rule.id)
        .fetch_one(&mut *tx)
        .await?;
        if pinned > 0 {
            return Err(CalendarError::RuleInUse {
                rule_id,
                reason: format!("{pinned} persisted occurrence(s) depend on its schedule"),
            });
        }

        sqlx::query(
            "UPDATE recurrence_rules SET name = $2, frequency = $3, params = $4 WHERE id = $1",
        )
        .bind(rule.id)
        .bind(&rule.name)
        .bind(&rule.frequency)
        .bind(rule.params.as_deref())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_rule(&self, id: RuleId) -> Result<(), CalendarError> {
        let result = sqlx::query("DELETE FROM recurrence_rules WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await;
        match result {
            Ok(done) if done.rows_affected() == 0 => Err(CalendarError::RuleNotFound(id)),
            Ok(_) => Ok(()),
            Err(e) if is_foreign_key_violation(&e) => {
                let referencing = self.events_for_rule(id).await?;
                Err(CalendarError::RuleInUse {
                    rule_id: id,
                    reason: format!("{} event(s) reference it", referencing.len()),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn events_for_rule(&self, id: RuleId) -> Result<Vec<EventId>, CalendarError> {
        let rows = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM events WHERE rule_id = $1 ORDER BY id",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(EventId::from_uuid).collect())
    }

    async fn insert_event(&self, event: StoredEvent) -> Result<(), CalendarError> {
        sqlx::query(
            "INSERT INTO events (id, name, creator, rule_id, startdatetime, enddatetime, allday) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(event.creator)
        .bind(event.rule_id)
        .bind(event.startdatetime)
        .bind(event.enddatetime)
        .bind(event.allday)
        .execute(&self.pool)
        .await
        .map_err(|e| event_write_error(e, &event))?;
        Ok(())
    }

    async fn get_event(&self, id: EventId) -> Result<StoredEvent, CalendarError> {
        sqlx::query_as::<_, StoredEvent>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CalendarError::EventNotFound(id))
    }

    async fn list_events(&self) -> Result<Vec<StoredEvent>, CalendarError> {
        let rows = sqlx::query_as::<_, StoredEvent>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY startdatetime ASC NULLS LAST, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_event(&self, event: StoredEvent) -> Result<(), CalendarError> {
        let result = sqlx::query(
            "UPDATE events SET name = $2, creator = $3, rule_id = $4, startdatetime = $5, \
             enddatetime = $6, allday = $7 WHERE id = $1",
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(event.creator)
        .bind(event.rule_id)
        .bind(event.startdatetime)
        .bind(event.enddatetime)
        .bind(event.allday)
        .execute(&self.pool)
        .await
        .map_err(|e| event_write_error(e, &event))?;
        if result.rows_affected() == 0 {
            return Err(CalendarError::EventNotFound(event.event_id()));
        }
        Ok(())
    }

    async fn delete_event(&self, id: EventId) -> Result<u64, CalendarError> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM occurrences WHERE event_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            tx.rollback().await?;
            return Err(CalendarError::EventNotFound(id));
        }
        tx.commit().await?;
        Ok(removed)
    }

    async fn create_occurrence(
        &self,
        occurrence: StoredOccurrence,
        schedule: Option<StoredRule>,
    ) -> Result<(StoredOccurrence, bool), CalendarError> {
        let event_id = EventId::from_uuid(occurrence.event_id);
        let mut tx = self.pool.begin().await?;

        let rule_id = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT rule_id FROM events WHERE id = $1 FOR SHARE",
        )
        .bind(occurrence.event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CalendarError::EventNotFound(event_id))?;

        let current = match rule_id {
            Some(rule_id) => {
                sqlx::query_as::<_, StoredRule>(
                    "SELECT id, name, frequency, params FROM recurrence_rules \
                     WHERE id = $1 FOR SHARE",
                )
                .bind(rule_id)
                .fetch_optional(&mut *tx)
                .await?
            }
            None => None,
        };
        let unchanged = match (&current, &schedule) {
            (None, None) => rule_id.is_none(),
            (Some(current), Some(expected)) => current.same_schedule(expected),
            _ => false,
        };
        if !unchanged {
            return Err(CalendarError::ScheduleChanged(event_id));
        }

        let inserted = sqlx::query_as::<_, StoredOccurrence>(&format!(
            "INSERT INTO occurrences ({OCCURRENCE_COLUMNS}) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (event_id, original_start) DO NOTHING RETURNING {OCCURRENCE_COLUMNS}"
        ))
        .bind(occurrence.id)
        .bind(occurrence.event_id)
        .bind(occurrence.original_start)
        .bind(occurrence.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let result = match inserted {
            Some(row) => (row, true),
            None => {
                let existing = sqlx::query_as::<_, StoredOccurrence>(&format!(
                    "SELECT {OCCURRENCE_COLUMNS} FROM occurrences \
                     WHERE event_id = $1 AND original_start = $2"
                ))
                .bind(occurrence.event_id)
                .bind(occurrence.original_start)
                .fetch_one(&mut *tx)
                .await?;
                (existing, false)
            }
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn get_occurrence(&self, id: OccurrenceId) -> Result<StoredOccurrence, CalendarError> {
        sqlx::query_as::<_, StoredOccurrence>(&format!(
            "SELECT {OCCURRENCE_COLUMNS} FROM occurrences WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CalendarError::OccurrenceNotFound(id))
    }

    async fn list_occurrences(
        &self,
        event_id: EventId,
    ) -> Result<Vec<StoredOccurrence>, CalendarError> {
        let rows = sqlx::query_as::<_, StoredOccurrence>(&format!(
            "SELECT {OCCURRENCE_COLUMNS} FROM occurrences \
             WHERE event_id = $1 ORDER BY original_start ASC"
        ))
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_occurrence(&self, id: OccurrenceId) -> Result<(), CalendarError> {
        let result = sqlx::query("DELETE FROM occurrences WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CalendarError::OccurrenceNotFound(id));
        }
        Ok(())
    }
}
