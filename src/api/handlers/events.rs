//! Event CRUD handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    DeleteEventResponse, EventListResponse, EventRequest, EventResponse, PaginationParams,
};
use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::{CalendarError, ErrorResponse};

/// `POST /events`: Create an event.
///
/// # Errors
///
/// Returns [`CalendarError`] on invalid fields or an unknown rule.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Creates a one-time event, or a recurring one when `rule_id` is set. A recurring event needs a start and end.",
    request_body = EventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid event", body = ErrorResponse),
        (status = 404, description = "Rule not found", body = ErrorResponse),
        (status = 422, description = "Recurring event without a start", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> Result<impl IntoResponse, CalendarError> {
    let event = state.calendar_service.create_event(req.into()).await?;
    Ok((StatusCode::CREATED, Json(EventResponse::from(&event))))
}

/// `GET /events`: List events.
///
/// # Errors
///
/// Returns [`CalendarError`] on store failures.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns a paginated list of events ordered by start; unscheduled events come last.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated event list", body = EventListResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, CalendarError> {
    let events = state.calendar_service.list_events().await?;
    let (page, pagination) = params.paginate(events);
    Ok(Json(EventListResponse {
        data: page.iter().map(EventResponse::from).collect(),
        pagination,
    }))
}

/// `GET /events/{id}`: Get an event.
///
/// # Errors
///
/// Returns [`CalendarError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get an event",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, CalendarError> {
    let event = state
        .calendar_service
        .get_event(EventId::from_uuid(id))
        .await?;
    Ok(Json(EventResponse::from(&event)))
}

/// `PUT /events/{id}`: Replace an event.
///
/// # Errors
///
/// Returns [`CalendarError`] on invalid fields, an unknown rule or an
/// unknown event.
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Update an event",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Invalid event", body = ErrorResponse),
        (status = 404, description = "Event or rule not found", body = ErrorResponse),
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<EventRequest>,
) -> Result<impl IntoResponse, CalendarError> {
    let event = state
        .calendar_service
        .update_event(EventId::from_uuid(id), req.into())
        .await?;
    Ok(Json(EventResponse::from(&event)))
}

/// `DELETE /events/{id}`: Delete an event and its persisted occurrences.
///
/// # Errors
///
/// Returns [`CalendarError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Delete an event",
    description = "Removes the event together with every persisted occurrence pinned to it.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event deleted", body = DeleteEventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, CalendarError> {
    let event_id = EventId::from_uuid(id);
    let occurrences_removed = state.calendar_service.delete_event(event_id).await?;
    Ok(Json(DeleteEventResponse {
        event_id,
        occurrences_removed,
    }))
}

/// Event management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event).get(list_events))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}
