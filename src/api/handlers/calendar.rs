//! Calendar query handlers: occurrences of one event inside a window,
//! a calendar month or a Sunday-first week.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    EventOccurrenceDto, EventOccurrencesResponse, OccurrenceTimesResponse, WindowQuery,
};
use crate::app_state::AppState;
use crate::domain::{EventId, Window};
use crate::error::{CalendarError, ErrorResponse};

/// `GET /events/{id}/occurrences`: Event-shaped occurrences in a window.
///
/// # Errors
///
/// Returns [`CalendarError`] on an invalid window or expansion failure.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/occurrences",
    tag = "Calendar",
    summary = "Materialize occurrences in a window",
    description = "Expands the event inside [start, end] (both inclusive). A one-time event is returned when its start lies in the window. Pinned instances carry their occurrence_id.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        WindowQuery,
    ),
    responses(
        (status = 200, description = "Occurrences in start order", body = EventOccurrencesResponse),
        (status = 400, description = "Invalid window", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 422, description = "Expansion limit exceeded", body = ErrorResponse),
    )
)]
pub async fn event_occurrences(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, CalendarError> {
    let event_id = EventId::from_uuid(id);
    let window = query.window()?;
    let occurrences = state
        .calendar_service
        .event_occurrences(event_id, window)
        .await?;
    Ok(Json(EventOccurrencesResponse {
        event_id,
        window: window.into(),
        data: occurrences
            .into_iter()
            .map(EventOccurrenceDto::from)
            .collect(),
    }))
}

/// `GET /events/{id}/occurrence-times`: Start instants in a window.
///
/// # Errors
///
/// Returns [`CalendarError::MissingRecurrenceRule`] for a one-time event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/occurrence-times",
    tag = "Calendar",
    summary = "Expand occurrence start times in a window",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        WindowQuery,
    ),
    responses(
        (status = 200, description = "Start instants in increasing order", body = OccurrenceTimesResponse),
        (status = 400, description = "Invalid window", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 422, description = "Event has no rule or expansion limit exceeded", body = ErrorResponse),
    )
)]
pub async fn occurrence_times(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, CalendarError> {
    let event_id = EventId::from_uuid(id);
    let window = query.window()?;
    let occurrences = state
        .calendar_service
        .occurrence_times(event_id, window)
        .await?;
    Ok(Json(OccurrenceTimesResponse {
        event_id,
        window: window.into(),
        occurrences,
    }))
}

/// `GET /events/{id}/calendar/month/{year}/{month}`: Month view.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidWindowBound`] if `month` is outside 1–12.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/calendar/month/{year}/{month}",
    tag = "Calendar",
    summary = "Occurrence start times within a calendar month",
    description = "The month window runs from the 1st at 00:00 UTC to the last nanosecond before the next month.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Month, 1 to 12"),
    ),
    responses(
        (status = 200, description = "Start instants in increasing order", body = OccurrenceTimesResponse),
        (status = 400, description = "Month out of range", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 422, description = "Event has no rule", body = ErrorResponse),
    )
)]
pub async fn month_occurrences(
    State(state): State<AppState>,
    Path((id, year, month)): Path<(uuid::Uuid, i32, u32)>,
) -> Result<impl IntoResponse, CalendarError> {
    let event_id = EventId::from_uuid(id);
    let window = Window::month(year, month)?;
    let occurrences = state
        .calendar_service
        .month_occurrences(event_id, year, month)
        .await?;
    Ok(Json(OccurrenceTimesResponse {
        event_id,
        window: window.into(),
        occurrences,
    }))
}

/// `GET /events/{id}/calendar/week/{year}/{week}`: Week view.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidWindowBound`] if `week` is outside 1–53.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/calendar/week/{year}/{week}",
    tag = "Calendar",
    summary = "Occurrence start times within a Sunday-first week",
    description = "Week 1 starts on the first Sunday of the year (strftime %U numbering). The window covers that Sunday through Saturday, UTC.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("year" = i32, Path, description = "Calendar year"),
        ("week" = u32, Path, description = "Week number, 1 to 53"),
    ),
    responses(
        (status = 200, description = "Start instants in increasing order", body = OccurrenceTimesResponse),
        (status = 400, description = "Week out of range", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 422, description = "Event has no rule", body = ErrorResponse),
    )
)]
pub async fn week_occurrences(
    State(state): State<AppState>,
    Path((id, year, week)): Path<(uuid::Uuid, i32, u32)>,
) -> Result<impl IntoResponse, CalendarError> {
    let event_id = EventId::from_uuid(id);
    let window = Window::week(year, week)?;
    let occurrences = state
        .calendar_service
        .week_occurrences(event_id, year, week)
        .await?;
    Ok(Json(OccurrenceTimesResponse {
        event_id,
        window: window.into(),
        occurrences,
    }))
}

/// Calendar query routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}/occurrences", get(event_occurrences))
        .route("/events/{id}/occurrence-times", get(occurrence_times))
        .route(
            "/events/{id}/calendar/month/{year}/{month}",
            get(month_occurrences),
        )
        .route(
            "/events/{id}/calendar/week/{year}/{week}",
            get(week_occurrences),
        )
}
