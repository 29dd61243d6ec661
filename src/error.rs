//! Calendar error types with HTTP status code mapping.
//!
//! [`CalendarError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EventId, OccurrenceId, RuleId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1003,
///     "message": "invalid window bound: month must be between 1 and 12, got 13",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the ranges on [`CalendarError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                  |
/// |-----------|---------------------|------------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request              |
/// | 2000–2999 | Not Found/Conflict  | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server              | 500 Internal Server Error    |
/// | 4000–4999 | Recurrence-Specific | 422 Unprocessable Entity     |
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Frequency value outside `YEARLY | MONTHLY | WEEKLY | DAILY`.
    #[error("invalid rule frequency: {0:?}")]
    InvalidRuleFrequency(String),

    /// Month outside 1–12, week outside 1–53, or a window whose end
    /// precedes its start.
    #[error("invalid window bound: {0}")]
    InvalidWindowBound(String),

    /// Recurrence parameters are out of range (e.g. interval 0).
    #[error("invalid rule parameters: {0}")]
    InvalidRuleParams(String),

    /// Recurrence rule with the given ID was not found.
    #[error("recurrence rule not found: {0}")]
    RuleNotFound(RuleId),

    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// Persisted occurrence with the given ID was not found.
    #[error("occurrence not found: {0}")]
    OccurrenceNotFound(OccurrenceId),

    /// The rule is still referenced and cannot be deleted or changed.
    #[error("recurrence rule {rule_id} is in use: {reason}")]
    RuleInUse {
        /// Rule that was the target of the rejected operation.
        rule_id: RuleId,
        /// What still depends on the rule.
        reason: String,
    },

    /// The event's rule changed while an occurrence of it was being pinned.
    #[error("schedule of event {0} changed concurrently, retry the request")]
    ScheduleChanged(EventId),

    /// Stored parameter bytes failed to decode.
    #[error("corrupt recurrence parameter encoding: {0}")]
    CorruptParameterEncoding(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Rule-dependent expansion was requested on an event without a rule.
    #[error("event {0} has no recurrence rule")]
    MissingRecurrenceRule(EventId),

    /// The event has no start/end, so there is nothing to anchor on.
    #[error("event {0} is not scheduled")]
    EventNotScheduled(EventId),

    /// The requested start is not produced by the event's schedule.
    #[error("{start} is not an occurrence of event {event_id}")]
    NotAnOccurrence {
        /// Event whose schedule was checked.
        event_id: EventId,
        /// Start instant that did not match.
        start: chrono::DateTime<chrono::Utc>,
    },

    /// Expansion visited more recurrence periods than allowed.
    #[error("recurrence expansion exceeded the limit of {0} periods")]
    UnboundedRecurrenceOverflow(u64),
}

impl CalendarError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidRuleFrequency(_) => 1002,
            Self::InvalidWindowBound(_) => 1003,
            Self::InvalidRuleParams(_) => 1004,
            Self::RuleNotFound(_) => 2001,
            Self::EventNotFound(_) => 2002,
            Self::OccurrenceNotFound(_) => 2003,
            Self::RuleInUse { .. } => 2004,
            Self::ScheduleChanged(_) => 2005,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::CorruptParameterEncoding(_) => 3002,
            Self::MissingRecurrenceRule(_) => 4001,
            Self::EventNotScheduled(_) => 4002,
            Self::NotAnOccurrence { .. } => 4003,
            Self::UnboundedRecurrenceOverflow(_) => 4004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidRuleFrequency(_)
            | Self::InvalidWindowBound(_)
            | Self::InvalidRuleParams(_) => StatusCode::BAD_REQUEST,
            Self::RuleNotFound(_) | Self::EventNotFound(_) | Self::OccurrenceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::RuleInUse { .. } | Self::ScheduleChanged(_) => StatusCode::CONFLICT,
            Self::CorruptParameterEncoding(_) | Self::PersistenceError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::MissingRecurrenceRule(_)
            | Self::EventNotScheduled(_)
            | Self::NotAnOccurrence { .. }
            | Self::UnboundedRecurrenceOverflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<sqlx::Error> for CalendarError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for CalendarError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
