//! Recurrence expansion.
//!
//! [`RecurrenceExpander`] turns a frequency, an anchor instant and a set of
//! [`RuleParams`] into the concrete occurrence instants inside a [`Window`].
//! Expansion is a lazily advancing cursor ([`Occurrences`]) over recurrence
//! periods; it never materializes occurrences outside the window.
//!
//! # Period semantics
//!
//! Period `k` is the anchor date stepped by `k * interval` units of the
//! frequency, at the anchor's UTC time of day. Every period is computed from
//! the anchor, so month-end clamping (Jan 31 → Feb 29 → Mar 31) never
//! drifts.
//!
//! | Frequency | `by_weekday` empty | `by_weekday` set                          |
//! |-----------|--------------------|-------------------------------------------|
//! | Daily     | the period date    | the period date if its weekday is listed  |
//! | Weekly    | the period date    | each listed weekday of the Monday week    |
//! | Monthly   | the period date    | every listed weekday of the period month  |
//! | Yearly    | the period date    | every listed weekday of the period year   |
//!
//! Nothing before the anchor is produced. `count` counts occurrences from
//! the anchor, not from the window start; `until` is inclusive.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use super::frequency::add_months_clamped;
use super::{Frequency, RuleParams, Window};
use crate::error::CalendarError;

/// Default cap on the number of periods one expansion may visit.
pub const DEFAULT_MAX_PERIODS: u64 = 100_000;

/// Pure recurrence expansion with a safety cap on visited periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceExpander {
    max_periods: u64,
}

impl RecurrenceExpander {
    /// Creates an expander that fails after visiting `max_periods` periods.
    #[must_use]
    pub const fn new(max_periods: u64) -> Self {
        Self { max_periods }
    }

    /// Returns the configured period cap.
    #[must_use]
    pub const fn max_periods(&self) -> u64 {
        self.max_periods
    }

    /// Returns the lazy occurrence cursor for the given rule and window.
    #[must_use]
    pub fn occurrences<'a>(
        &self,
        frequency: Frequency,
        anchor: DateTime<Utc>,
        params: &'a RuleParams,
        window: Window,
    ) -> Occurrences<'a> {
        Occurrences::new(frequency, anchor, params, window, self.max_periods)
    }

    /// Expands the rule into every occurrence inside `window`, in strictly
    /// increasing order.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnboundedRecurrenceOverflow`] if more than
    /// the configured number of periods had to be visited. No partial
    /// result is returned.
    pub fn expand(
        &self,
        frequency: Frequency,
        anchor: DateTime<Utc>,
        params: &RuleParams,
        window: Window,
    ) -> Result<Vec<DateTime<Utc>>, CalendarError> {
        self.occurrences(frequency, anchor, params, window).collect()
    }

    /// Returns `true` if `instant` is an occurrence of the rule.
    ///
    /// # Errors
    ///
    /// Propagates [`CalendarError::UnboundedRecurrenceOverflow`].
    pub fn is_occurrence(
        &self,
        frequency: Frequency,
        anchor: DateTime<Utc>,
        params: &RuleParams,
        instant: DateTime<Utc>,
    ) -> Result<bool, CalendarError> {
        let window = Window::new(instant, instant)?;
        let mut cursor = self.occurrences(frequency, anchor, params, window);
        cursor.next().transpose().map(|hit| hit.is_some())
    }
}

impl Default for RecurrenceExpander {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PERIODS)
    }
}

/// Candidate instants of a single period.
#[derive(Debug)]
struct Period {
    /// Earliest instant any candidate of this period could take.
    floor: DateTime<Utc>,
    candidates: Vec<DateTime<Utc>>,
}

/// Lazy cursor over the occurrences of a rule inside a window.
///
/// Yields `Ok(instant)` in strictly increasing order. If the period cap is
/// reached it yields a single `Err` and then ends.
#[derive(Debug)]
pub struct Occurrences<'a> {
    frequency: Frequency,
    anchor: DateTime<Utc>,
    params: &'a RuleParams,
    window: Window,
    max_periods: u64,
    period: u64,
    visited: u64,
    emitted: u64,
    pending: std::vec::IntoIter<DateTime<Utc>>,
    last: Option<DateTime<Utc>>,
    finished: bool,
}

impl<'a> Occurrences<'a> {
    fn new(
        frequency: Frequency,
        anchor: DateTime<Utc>,
        params: &'a RuleParams,
        window: Window,
        max_periods: u64,
    ) -> Self {
        let mut cursor = Self {
            frequency,
            anchor,
            params,
            window,
            max_periods,
            period: 0,
            visited: 0,
            emitted: 0,
            pending: Vec::new().into_iter(),
            last: None,
            finished: anchor > window.end(),
        };
        let skip = cursor.first_relevant_period();
        cursor.period = skip;
        // Without weekday selection every period yields exactly one
        // occurrence, so the skipped periods account for `skip` emissions.
        if params.by_weekday().is_empty() {
            cursor.emitted = skip;
        }
        cursor
    }

    /// Index of the first period worth visiting. Jumping ahead is only safe
    /// when `count` does not need every earlier occurrence to be tallied
    /// individually.
    fn first_relevant_period(&self) -> u64 {
        if self.params.count().is_some() && !self.params.by_weekday().is_empty() {
            return 0;
        }
        let from = self.anchor.date_naive();
        let to = self.window.start().date_naive();
        if to <= from {
            return 0;
        }
        let units = match self.frequency {
            Frequency::Daily => to.signed_duration_since(from).num_days(),
            Frequency::Weekly => to.signed_duration_since(from).num_days() / 7,
            Frequency::Monthly => months_between(from, to),
            Frequency::Yearly => i64::from(to.year() - from.year()),
        };
        let units = u64::try_from(units).unwrap_or(0);
        (units / u64::from(self.params.interval())).saturating_sub(1)
    }

    fn at_anchor_time(&self, date: NaiveDate) -> DateTime<Utc> {
        date.and_time(self.anchor.time()).and_utc()
    }

    fn selects(&self, date: NaiveDate) -> bool {
        let days = self.params.by_weekday();
        days.is_empty() || days.contains(&date.weekday())
    }

    /// Builds period `k`, or `None` once the calendar range is exhausted.
    fn period_at(&self, k: u64) -> Option<Period> {
        let steps = k.checked_mul(u64::from(self.params.interval()))?;
        let anchor_date = self.anchor.date_naive();
        let by_weekday = self.params.by_weekday();

        match self.frequency {
            Frequency::Weekly if !by_weekday.is_empty() => {
                let base = self.frequency.step()(anchor_date, steps)?;
                let monday = base.checked_sub_days(Days::new(u64::from(
                    base.weekday().num_days_from_monday(),
                )))?;
                let candidates = by_weekday
                    .iter()
                    .filter_map(|day| {
                        monday.checked_add_days(Days::new(u64::from(day.num_days_from_monday())))
                    })
                    .map(|date| self.at_anchor_time(date))
                    .filter(|t| *t >= self.anchor)
                    .collect();
                Some(Period {
                    floor: self.at_anchor_time(monday),
                    candidates,
                })
            }
            Frequency::Monthly if !by_weekday.is_empty() => {
                let first = add_months_clamped(anchor_date.with_day(1)?, steps)?;
                let candidates = first
                    .iter_days()
                    .take_while(|date| date.month() == first.month())
                    .filter(|date| self.selects(*date))
                    .map(|date| self.at_anchor_time(date))
                    .filter(|t| *t >= self.anchor)
                    .collect();
                Some(Period {
                    floor: self.at_anchor_time(first),
                    candidates,
                })
            }
            Frequency::Yearly if !by_weekday.is_empty() => {
                let year = i32::try_from(steps)
                    .ok()
                    .and_then(|steps| anchor_date.year().checked_add(steps))?;
                let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
                let candidates = first
                    .iter_days()
                    .take_while(|date| date.year() == year)
                    .filter(|date| self.selects(*date))
                    .map(|date| self.at_anchor_time(date))
                    .filter(|t| *t >= self.anchor)
                    .collect();
                Some(Period {
                    floor: self.at_anchor_time(first),
                    candidates,
                })
            }
            _ => {
                let date = self.frequency.step()(anchor_date, steps)?;
                let at = self.at_anchor_time(date);
                let candidates = if self.selects(date) {
                    vec![at]
                } else {
                    Vec::new()
                };
                Some(Period {
                    floor: at,
                    candidates,
                })
            }
        }
    }

    fn past_end(&self, instant: DateTime<Utc>) -> bool {
        instant > self.window.end() || self.params.until().is_some_and(|until| instant > until)
    }

    fn count_reached(&self) -> bool {
        self.params
            .count()
            .is_some_and(|count| self.emitted >= u64::from(count))
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Result<DateTime<Utc>, CalendarError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(candidate) = self.pending.next() {
                if self.count_reached() || self.past_end(candidate) {
                    self.finished = true;
                    return None;
                }
                if self.last.is_some_and(|last| candidate <= last) {
                    continue;
                }
                self.emitted += 1;
                self.last = Some(candidate);
                if candidate < self.window.start() {
                    continue;
                }
                return Some(Ok(candidate));
            }

            if self.count_reached() {
                self.finished = true;
                return None;
            }
            if self.visited >= self.max_periods {
                self.finished = true;
                return Some(Err(CalendarError::UnboundedRecurrenceOverflow(
                    self.max_periods,
                )));
            }
            self.visited += 1;

            let Some(period) = self.period_at(self.period) else {
                self.finished = true;
                return None;
            };
            if self.past_end(period.floor) {
                self.finished = true;
                return None;
            }
            self.pending = period.candidates.into_iter();
            self.period = self.period.saturating_add(1);
        }
    }
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let years = i64::from(to.year()) - i64::from(from.year());
    years * 12 + i64::from(to.month()) - i64::from(from.month())
}
