//! Recurrence frequency and the calendar step functions it selects.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CalendarError;

/// Advances an anchor date by `steps` units of one frequency.
///
/// Returns `None` when the result falls outside the representable
/// calendar range.
pub type StepFn = fn(NaiveDate, u64) -> Option<NaiveDate>;

/// How often a recurrence rule repeats.
///
/// Stored as the upper-case text `YEARLY`, `MONTHLY`, `WEEKLY` or `DAILY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    /// Once every `interval` years.
    Yearly,
    /// Once every `interval` months.
    Monthly,
    /// Once every `interval` weeks.
    Weekly,
    /// Once every `interval` days.
    Daily,
}

impl Frequency {
    /// All frequencies, in the order they are offered to administrators.
    pub const ALL: [Self; 4] = [Self::Yearly, Self::Monthly, Self::Weekly, Self::Daily];

    /// Returns the canonical storage text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yearly => "YEARLY",
            Self::Monthly => "MONTHLY",
            Self::Weekly => "WEEKLY",
            Self::Daily => "DAILY",
        }
    }

    /// Returns the display label used in pickers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yearly => "yearly",
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
            Self::Daily => "daily",
        }
    }

    /// Returns the step function for this frequency.
    #[must_use]
    pub fn step(self) -> StepFn {
        match self {
            Self::Yearly => step_years,
            Self::Monthly => step_months,
            Self::Weekly => step_weeks,
            Self::Daily => step_days,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|freq| freq.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CalendarError::InvalidRuleFrequency(s.to_string()))
    }
}

fn step_days(anchor: NaiveDate, steps: u64) -> Option<NaiveDate> {
    anchor.checked_add_days(Days::new(steps))
}

fn step_weeks(anchor: NaiveDate, steps: u64) -> Option<NaiveDate> {
    anchor.checked_add_days(Days::new(steps.checked_mul(7)?))
}

fn step_months(anchor: NaiveDate, steps: u64) -> Option<NaiveDate> {
    add_months_clamped(anchor, steps)
}

fn step_years(anchor: NaiveDate, steps: u64) -> Option<NaiveDate> {
    add_months_clamped(anchor, steps.checked_mul(12)?)
}

/// Adds whole months to `date`, clamping the day to the end of the
/// target month (Jan 31 + 1 month = Feb 28/29).
#[must_use]
pub fn add_months_clamped(date: NaiveDate, months: u64) -> Option<NaiveDate> {
    let months = i64::try_from(months).ok()?;
    let index = i64::from(date.year())
        .checked_mul(12)?
        .checked_add(i64::from(date.month0()))?
        .checked_add(months)?;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Number of days in the given month, or `None` outside chrono's range.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}
