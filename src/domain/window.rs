//! Inclusive query windows.
//!
//! Month and week windows end one nanosecond before the next period starts,
//! so an occurrence at midnight on the 1st of the next month is not counted
//! twice by adjacent month views.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeDelta, Utc};
use serde::Serialize;

use crate::error::CalendarError;

/// An inclusive `[start, end]` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Window {
    /// Creates a window.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidWindowBound`] if `end < start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CalendarError> {
        if end < start {
            return Err(CalendarError::InvalidWindowBound(format!(
                "window end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The calendar month `month` of `year`, in UTC.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidWindowBound`] if `month` is outside
    /// 1–12 or the year is out of range.
    pub fn month(year: i32, month: u32) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidWindowBound(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| out_of_range(year))?;
        let next = if month == 12 {
            year.checked_add(1)
                .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| out_of_range(year))?;
        Self::half_open(first, next)
    }

    /// Week `week` of `year`, numbered with Sunday as the first day of the
    /// week (`%U`): week 1 begins on the year's first Sunday and the days
    /// before it form week 0. Week 53 may begin in the following year.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidWindowBound`] if `week` is outside
    /// 1–53 or the year is out of range.
    pub fn week(year: i32, week: u32) -> Result<Self, CalendarError> {
        if !(1..=53).contains(&week) {
            return Err(CalendarError::InvalidWindowBound(format!(
                "week must be between 1 and 53, got {week}"
            )));
        }
        let first = sunday_week_start(year, week).ok_or_else(|| out_of_range(year))?;
        let next = first
            .checked_add_days(Days::new(7))
            .ok_or_else(|| out_of_range(year))?;
        Self::half_open(first, next)
    }

    /// First instant in the window.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Last instant in the window.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns `true` if `instant` lies within the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    fn half_open(first: NaiveDate, next: NaiveDate) -> Result<Self, CalendarError> {
        let start = first.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = next.and_time(chrono::NaiveTime::MIN).and_utc() - TimeDelta::nanoseconds(1);
        Self::new(start, end)
    }
}

/// Date of the Sunday that starts `%U` week `week` of `year`.
#[must_use]
pub fn sunday_week_start(year: i32, week: u32) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let week0_len = (7 - jan1.weekday().num_days_from_sunday()) % 7;
    let offset = u64::from(week0_len) + 7 * u64::from(week.checked_sub(1)?);
    jan1.checked_add_days(Days::new(offset))
}

fn out_of_range(year: i32) -> CalendarError {
    CalendarError::InvalidWindowBound(format!("year {year} is out of range"))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        let Some(dt) = Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single() else {
            panic!("invalid test date");
        };
        dt
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(y, m, d) else {
            panic!("invalid test date");
        };
        date
    }

    #[test]
    fn rejects_inverted_window() {
        let result = Window::new(at(2024, 2, 1), at(2024, 1, 1));
        assert!(matches!(result, Err(CalendarError::InvalidWindowBound(_))));
    }

    #[test]
    fn single_instant_window_is_valid() {
        let Ok(window) = Window::new(at(2024, 1, 1), at(2024, 1, 1)) else {
            panic!("valid window");
        };
        assert!(window.contains(at(2024, 1, 1)));
    }

    #[test]
    fn month_window_covers_the_month_only() {
        let Ok(window) = Window::month(2024, 2) else {
            panic!("valid month");
        };
        assert_eq!(window.start(), at(2024, 2, 1));
        assert!(window.contains(at(2024, 2, 29)));
        assert!(!window.contains(at(2024, 3, 1)));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let Ok(window) = Window::month(2024, 12) else {
            panic!("valid month");
        };
        assert_eq!(window.end(), at(2025, 1, 1) - TimeDelta::nanoseconds(1));
    }

    #[test]
    fn month_out_of_range_fails() {
        assert!(matches!(
            Window::month(2024, 13),
            Err(CalendarError::InvalidWindowBound(_))
        ));
        assert!(matches!(
            Window::month(2024, 0),
            Err(CalendarError::InvalidWindowBound(_))
        ));
    }

    #[test]
    fn week_numbering_starts_on_first_sunday() {
        // 2024-01-01 is a Monday, so week 1 starts on Sunday 2024-01-07.
        assert_eq!(sunday_week_start(2024, 1), Some(date(2024, 1, 7)));
        assert_eq!(sunday_week_start(2024, 10), Some(date(2024, 3, 10)));
        // 2023-01-01 is a Sunday, so week 1 starts that day.
        assert_eq!(sunday_week_start(2023, 1), Some(date(2023, 1, 1)));
        // 2022-01-01 is a Saturday.
        assert_eq!(sunday_week_start(2022, 1), Some(date(2022, 1, 2)));
    }

    #[test]
    fn week_start_is_always_sunday() {
        for year in 2020..2030 {
            for week in [1, 26, 53] {
                let Some(start) = sunday_week_start(year, week) else {
                    panic!("valid week");
                };
                assert_eq!(start.weekday(), Weekday::Sun);
            }
        }
    }

    #[test]
    fn week_53_may_spill_into_next_year() {
        // 2023 week 1 starts Jan 1, so week 53 starts on 2023-12-31.
        assert_eq!(sunday_week_start(2023, 53), Some(date(2023, 12, 31)));
        // 2024 week 53 starts 2025-01-05.
        assert_eq!(sunday_week_start(2024, 53), Some(date(2025, 1, 5)));
    }

    #[test]
    fn week_window_spans_seven_days() {
        let Ok(window) = Window::week(2024, 1) else {
            panic!("valid week");
        };
        assert_eq!(window.start(), at(2024, 1, 7));
        assert!(window.contains(at(2024, 1, 13)));
        assert!(!window.contains(at(2024, 1, 14)));
    }

    #[test]
    fn week_out_of_range_fails() {
        assert!(matches!(
            Window::week(2024, 0),
            Err(CalendarError::InvalidWindowBound(_))
        ));
        assert!(matches!(
            Window::week(2024, 54),
            Err(CalendarError::InvalidWindowBound(_))
        ));
    }
}
