//! Schedulable events and their materialized occurrences.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::recurrence_rule::validate_name;
use super::{EventId, OccurrenceId, RecurrenceExpander, RecurrenceRule, RuleId, UserId, Window};
use crate::error::CalendarError;

/// A calendar event, one-time or recurring through its [`RecurrenceRule`].
///
/// When a rule is attached, `startdatetime` is the recurrence anchor and
/// `enddatetime - startdatetime` is the duration given to every occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// Display label.
    pub name: String,
    /// Identity that created the event.
    pub creator: UserId,
    /// Resolved recurrence rule, if the event repeats.
    pub rule: Option<RecurrenceRule>,
    /// Start of the first occurrence.
    pub startdatetime: Option<DateTime<Utc>>,
    /// End of the first occurrence.
    pub enddatetime: Option<DateTime<Utc>>,
    /// Whether the event spans whole days.
    pub allday: bool,
}

/// One concrete instance of an [`Event`] inside a query window.
///
/// Carries the same name, creator, rule and all-day flag as the event, with
/// occurrence-specific start and end. `occurrence_id` is set when the
/// instance has been pinned as a persisted [`super::Occurrence`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventOccurrence {
    /// Originating event.
    pub event_id: EventId,
    /// Event name.
    pub name: String,
    /// Event creator.
    pub creator: UserId,
    /// Rule the instance was expanded from, if any.
    pub rule_id: Option<RuleId>,
    /// Instance start.
    pub startdatetime: DateTime<Utc>,
    /// Instance end.
    pub enddatetime: DateTime<Utc>,
    /// Whether the instance spans whole days.
    pub allday: bool,
    /// Persisted occurrence pinning this instance, if any.
    pub occurrence_id: Option<OccurrenceId>,
}

impl Event {
    /// Checks the scheduling invariants.
    ///
    /// # Errors
    ///
    /// - [`CalendarError::InvalidRequest`] for a bad name, a start without
    ///   an end (or vice versa), or an end before the start.
    /// - [`CalendarError::EventNotScheduled`] if a rule is attached but the
    ///   event has no start to anchor on.
    pub fn validate(&self) -> Result<(), CalendarError> {
        validate_name("event", &self.name)?;
        match (self.startdatetime, self.enddatetime) {
            (Some(start), Some(end)) if end < start => Err(CalendarError::InvalidRequest(
                "enddatetime must not precede startdatetime".to_string(),
            )),
            (Some(_), None) | (None, Some(_)) => Err(CalendarError::InvalidRequest(
                "startdatetime and enddatetime must be set together".to_string(),
            )),
            (None, None) if self.rule.is_some() => Err(CalendarError::EventNotScheduled(self.id)),
            _ => Ok(()),
        }
    }

    /// Identifier of the attached rule, if any.
    #[must_use]
    pub fn rule_id(&self) -> Option<RuleId> {
        self.rule.as_ref().map(|rule| rule.id)
    }

    /// Fixed duration applied to every occurrence.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        match (self.startdatetime, self.enddatetime) {
            (Some(start), Some(end)) => end - start,
            _ => TimeDelta::zero(),
        }
    }

    /// Materializes the occurrences of this event inside `window`.
    ///
    /// Recurring events are expanded from `startdatetime`. A non-recurring
    /// event is its own single occurrence when its start lies within the
    /// window (both bounds inclusive); unscheduled events yield nothing.
    ///
    /// # Errors
    ///
    /// Propagates expansion errors (see [`Event::get_occurrences`]) and
    /// returns [`CalendarError::InvalidWindowBound`] if an occurrence's end
    /// falls outside the representable date range.
    pub fn get_event_occurrences(
        &self,
        expander: &RecurrenceExpander,
        window: Window,
    ) -> Result<Vec<EventOccurrence>, CalendarError> {
        if self.rule.is_none() {
            return self
                .startdatetime
                .filter(|start| window.contains(*start))
                .map(|start| self.occurrence_at(start))
                .into_iter()
                .collect();
        }
        self.get_occurrences(expander, window)?
            .into_iter()
            .map(|start| self.occurrence_at(start))
            .collect()
    }

    /// Expands the rule into occurrence start instants inside `window`.
    ///
    /// # Errors
    ///
    /// - [`CalendarError::MissingRecurrenceRule`] if no rule is attached.
    /// - [`CalendarError::EventNotScheduled`] if there is no anchor.
    /// - [`CalendarError::UnboundedRecurrenceOverflow`] from the expander.
    pub fn get_occurrences(
        &self,
        expander: &RecurrenceExpander,
        window: Window,
    ) -> Result<Vec<DateTime<Utc>>, CalendarError> {
        let rule = self
            .rule
            .as_ref()
            .ok_or(CalendarError::MissingRecurrenceRule(self.id))?;
        let anchor = self
            .startdatetime
            .ok_or(CalendarError::EventNotScheduled(self.id))?;
        let params = rule.effective_params();
        expander.expand(rule.frequency, anchor, &params, window)
    }

    /// Occurrence starts within calendar month `month` of `year` (UTC).
    ///
    /// # Errors
    ///
    /// [`CalendarError::InvalidWindowBound`] if `month` is outside 1–12,
    /// otherwise as [`Event::get_occurrences`].
    pub fn get_month_occurrences(
        &self,
        expander: &RecurrenceExpander,
        year: i32,
        month: u32,
    ) -> Result<Vec<DateTime<Utc>>, CalendarError> {
        self.get_occurrences(expander, Window::month(year, month)?)
    }

    /// Occurrence starts within Sunday-first week `week` of `year` (UTC).
    ///
    /// # Errors
    ///
    /// [`CalendarError::InvalidWindowBound`] if `week` is outside 1–53,
    /// otherwise as [`Event::get_occurrences`].
    pub fn get_week_occurrences(
        &self,
        expander: &RecurrenceExpander,
        year: i32,
        week: u32,
    ) -> Result<Vec<DateTime<Utc>>, CalendarError> {
        self.get_occurrences(expander, Window::week(year, week)?)
    }

    /// Returns `true` if an occurrence of this event starts at `start`.
    ///
    /// # Errors
    ///
    /// As [`Event::get_occurrences`], except that a missing rule is not an
    /// error: a one-time event only occurs at its own start.
    pub fn occurs_at(
        &self,
        expander: &RecurrenceExpander,
        start: DateTime<Utc>,
    ) -> Result<bool, CalendarError> {
        match &self.rule {
            None => Ok(self.startdatetime == Some(start)),
            Some(rule) => {
                let anchor = self
                    .startdatetime
                    .ok_or(CalendarError::EventNotScheduled(self.id))?;
                expander.is_occurrence(rule.frequency, anchor, &rule.effective_params(), start)
            }
        }
    }

    fn occurrence_at(&self, start: DateTime<Utc>) -> Result<EventOccurrence, CalendarError> {
        let end = start.checked_add_signed(self.duration()).ok_or_else(|| {
            CalendarError::InvalidWindowBound(format!(
                "occurrence of event {} starting at {start} ends past the supported date range",
                self.id
            ))
        })?;
        Ok(EventOccurrence {
            event_id: self.id,
            name: self.name.clone(),
            creator: self.creator,
            rule_id: self.rule_id(),
            startdatetime: start,
            enddatetime: end,
            allday: self.allday,
            occurrence_id: None,
        })
    }
}
