//! DTOs for recurrence rule endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PaginationMeta;
use crate::domain::rule_params::{parse_weekday, weekday_code};
use crate::domain::{EventId, Frequency, RecurrenceRule, RuleId, RuleParams};
use crate::error::CalendarError;
use crate::service::RuleDraft;

/// Recurrence parameters as exchanged over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RuleParamsDto {
    /// Step size in units of the frequency. Defaults to 1.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Total number of occurrences counted from the event start.
    #[serde(default)]
    pub count: Option<u32>,
    /// Last instant an occurrence may start on (inclusive).
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    /// Weekday selectors (`MO`, `TU`, ... or English day names).
    #[serde(default)]
    pub by_weekday: Vec<String>,
}

fn default_interval() -> u32 {
    1
}

impl RuleParamsDto {
    /// Validates and converts into domain parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidRuleParams`] for an unknown weekday
    /// or an out-of-range interval or count.
    pub fn into_params(self) -> Result<RuleParams, CalendarError> {
        let by_weekday = self
            .by_weekday
            .iter()
            .map(|text| {
                parse_weekday(text).ok_or_else(|| {
                    CalendarError::InvalidRuleParams(format!("unknown weekday {text:?}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        RuleParams::new(self.interval, self.count, self.until, by_weekday)
    }
}

impl From<&RuleParams> for RuleParamsDto {
    fn from(params: &RuleParams) -> Self {
        Self {
            interval: params.interval(),
            count: params.count(),
            until: params.until(),
            by_weekday: params
                .by_weekday()
                .iter()
                .map(|day| weekday_code(*day).to_string())
                .collect(),
        }
    }
}

/// Request body for `POST /rules` and `PUT /rules/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RuleRequest {
    /// Display label (1 to 36 characters).
    pub name: String,
    /// `YEARLY`, `MONTHLY`, `WEEKLY` or `DAILY` (case-insensitive).
    pub frequency: String,
    /// Optional recurrence parameters.
    #[serde(default)]
    pub params: Option<RuleParamsDto>,
}

impl RuleRequest {
    /// Validates the request into a service draft.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidRuleFrequency`] or
    /// [`CalendarError::InvalidRuleParams`].
    pub fn into_draft(self) -> Result<RuleDraft, CalendarError> {
        let frequency: Frequency = self.frequency.parse()?;
        let params = self.params.map(RuleParamsDto::into_params).transpose()?;
        Ok(RuleDraft {
            name: self.name,
            frequency,
            params,
        })
    }
}

/// A recurrence rule.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RuleResponse {
    /// Rule identifier.
    pub id: RuleId,
    /// Display label.
    pub name: String,
    /// Repetition unit.
    pub frequency: Frequency,
    /// Decoded parameters, absent when none were set.
    pub params: Option<RuleParamsDto>,
}

impl From<&RecurrenceRule> for RuleResponse {
    fn from(rule: &RecurrenceRule) -> Self {
        Self {
            id: rule.id,
            name: rule.name.clone(),
            frequency: rule.frequency,
            params: rule.get_params().map(RuleParamsDto::from),
        }
    }
}

/// Paginated list of rules.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleListResponse {
    /// Rules on this page.
    pub data: Vec<RuleResponse>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Events that reference a rule.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleEventsResponse {
    /// Rule identifier.
    pub rule_id: RuleId,
    /// Referencing events.
    pub event_ids: Vec<EventId>,
}
