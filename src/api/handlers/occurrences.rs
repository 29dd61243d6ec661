//! Persisted occurrence handlers: pin, list, get, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{OccurrenceListResponse, OccurrenceResponse, PinOccurrenceRequest};
use crate::app_state::AppState;
use crate::domain::{EventId, OccurrenceId};
use crate::error::{CalendarError, ErrorResponse};

/// `POST /events/{id}/pinned-occurrences`: Persist one instance.
///
/// Returns `201` when a new occurrence was created and `200` with the
/// existing one when the instance was already pinned.
///
/// # Errors
///
/// Returns [`CalendarError::NotAnOccurrence`] if the event's schedule does
/// not produce the requested start, or [`CalendarError::ScheduleChanged`] if
/// its rule was replaced mid-request.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/pinned-occurrences",
    tag = "Occurrences",
    summary = "Pin an occurrence",
    description = "Creates a durable identifier for the instance starting at `start`. Repeating the request returns the same occurrence.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = PinOccurrenceRequest,
    responses(
        (status = 201, description = "Occurrence created", body = OccurrenceResponse),
        (status = 200, description = "Occurrence already existed", body = OccurrenceResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "The event's rule changed while pinning", body = ErrorResponse),
        (status = 422, description = "Start is not an occurrence of the event", body = ErrorResponse),
    )
)]
pub async fn pin_occurrence(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PinOccurrenceRequest>,
) -> Result<impl IntoResponse, CalendarError> {
    let (occurrence, created) = state
        .calendar_service
        .persist_occurrence(EventId::from_uuid(id), req.start)
        .await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(OccurrenceResponse::from(&occurrence))))
}

/// `GET /events/{id}/pinned-occurrences`: List persisted occurrences.
///
/// # Errors
///
/// Returns [`CalendarError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/pinned-occurrences",
    tag = "Occurrences",
    summary = "List pinned occurrences of an event",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Pinned occurrences in start order", body = OccurrenceListResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_pinned(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, CalendarError> {
    let event_id = EventId::from_uuid(id);
    let occurrences = state
        .calendar_service
        .list_persisted_occurrences(event_id)
        .await?;
    Ok(Json(OccurrenceListResponse {
        event_id,
        data: occurrences.iter().map(OccurrenceResponse::from).collect(),
    }))
}

/// `GET /occurrences/{id}`: Get a persisted occurrence.
///
/// # Errors
///
/// Returns [`CalendarError::OccurrenceNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/occurrences/{id}",
    tag = "Occurrences",
    summary = "Get a pinned occurrence",
    params(
        ("id" = uuid::Uuid, Path, description = "Occurrence UUID"),
    ),
    responses(
        (status = 200, description = "Occurrence details", body = OccurrenceResponse),
        (status = 404, description = "Occurrence not found", body = ErrorResponse),
    )
)]
pub async fn get_occurrence(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, CalendarError> {
    let occurrence = state
        .calendar_service
        .get_occurrence(OccurrenceId::from_uuid(id))
        .await?;
    Ok(Json(OccurrenceResponse::from(&occurrence)))
}

/// `DELETE /occurrences/{id}`: Delete a persisted occurrence.
///
/// # Errors
///
/// Returns [`CalendarError::OccurrenceNotFound`] if it does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/occurrences/{id}",
    tag = "Occurrences",
    summary = "Unpin an occurrence",
    params(
        ("id" = uuid::Uuid, Path, description = "Occurrence UUID"),
    ),
    responses(
        (status = 204, description = "Occurrence deleted"),
        (status = 404, description = "Occurrence not found", body = ErrorResponse),
    )
)]
pub async fn delete_occurrence(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, CalendarError> {
    state
        .calendar_service
        .delete_occurrence(OccurrenceId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Persisted occurrence routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/events/{id}/pinned-occurrences",
            get(list_pinned).post(pin_occurrence),
        )
        .route(
            "/occurrences/{id}",
            get(get_occurrence).delete(delete_occurrence),
        )
}
